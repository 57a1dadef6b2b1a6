// Bundled profiles: NVEncC HEVC video, libopus audio

use super::{OptionArgs, ParamSpec, ProfileTable, ProfileTemplate, TemplateParams, COPY, DEFAULT};

const NVENC_TAIL: [&str; 14] = [
    "--codec",
    "h265",
    "--preset",
    "quality",
    "--level",
    "auto",
    "--output-depth",
    "10",
    "--aq-temporal",
    "--mv-precision",
    "Q-pel",
    "--lookahead",
    "32",
    "--avhw",
];

const VIDEO_BITRATE: ParamSpec = ParamSpec {
    name: "bitrate",
    aliases: &["bitrate", "bitvid"],
    default: "1200",
};

const VIDEO_QP: ParamSpec = ParamSpec {
    name: "q",
    aliases: &["q"],
    default: "20",
};

const fn audio_bitrate(default: &'static str) -> ParamSpec {
    ParamSpec {
        name: "abitrate",
        aliases: &["abitrate", "bitaud"],
        default,
    }
}

fn vbrhq(params: &TemplateParams) -> OptionArgs {
    let mut args = OptionArgs::new(["--vbrhq", params.get("bitrate")]);
    args.extend(NVENC_TAIL);
    args
}

fn cqp(params: &TemplateParams) -> OptionArgs {
    let mut args = OptionArgs::new(["--cqp", params.get("q")]);
    args.extend(NVENC_TAIL);
    args
}

fn libopus(params: &TemplateParams) -> OptionArgs {
    OptionArgs::new(["-c:a", "libopus", "-b:a", params.get("abitrate")])
}

/// 7.1 folded down to 5.1
fn opus_8_6(params: &TemplateParams) -> OptionArgs {
    let mut args = libopus(params);
    args.extend([
        "-vbr",
        "on",
        "-ac",
        "6",
        "-af",
        "pan=5.1|FL=FL+0.5*BL+0.5*LFE|FR=FR+0.5*BR+0.5*LFE|FC=FC|BL=0.5*BL+0.5*LFE|BR=0.5*BR+0.5*LFE",
    ]);
    args
}

fn opus_5_1(params: &TemplateParams) -> OptionArgs {
    let mut args = libopus(params);
    args.extend(["-af", "channelmap=channel_layout=5.1"]);
    args
}

/// Surround folded to stereo with boosted dialogue
fn opus_pans(params: &TemplateParams) -> OptionArgs {
    let mut args = libopus(params);
    args.extend([
        "-af",
        "volume=1.65,pan=stereo|FL=0.5*FC+0.707*FL+0.707*BL+0.5*LFE|FR=0.5*FC+0.707*FR+0.707*BR+0.5*LFE",
    ]);
    args
}

fn opus_stereo(params: &TemplateParams) -> OptionArgs {
    let mut args = libopus(params);
    args.extend(["-ac", "2"]);
    args
}

pub(super) fn table() -> ProfileTable {
    let mut table = ProfileTable::new();

    table.insert_video(
        DEFAULT,
        ProfileTemplate::Fixed(OptionArgs::new([
            "--vbrhq",
            "1200",
            "--codec",
            "h265",
            "--preset",
            "quality",
            "--level",
            "auto",
            "--output-depth",
            "10",
        ])),
    );
    table.insert_video(
        "2pass",
        ProfileTemplate::Parametrized {
            params: vec![VIDEO_BITRATE],
            build: vbrhq,
        },
    );
    table.insert_video(
        "cqp",
        ProfileTemplate::Parametrized {
            params: vec![VIDEO_QP],
            build: cqp,
        },
    );
    table.insert_video(COPY, ProfileTemplate::Fixed(OptionArgs::new([COPY])));

    let audio: [(&str, &'static str, fn(&TemplateParams) -> OptionArgs); 4] = [
        ("opus-8-6", "320k", opus_8_6),
        ("opus-5.1", "224k", opus_5_1),
        ("opus-pans", "128k", opus_pans),
        ("opus-stereo", "100k", opus_stereo),
    ];
    for (key, default, build) in audio {
        table.insert_audio(
            key,
            ProfileTemplate::Parametrized {
                params: vec![audio_bitrate(default)],
                build,
            },
            "opus",
        );
    }
    table.insert_audio(
        COPY,
        ProfileTemplate::Fixed(OptionArgs::new(["-c:a", "copy"])),
        "mka",
    );
    table.insert_audio(
        DEFAULT,
        ProfileTemplate::Fixed(OptionArgs::new(["-c:a", "libopus", "-b:a", "192k"])),
        "opus",
    );

    table
}
