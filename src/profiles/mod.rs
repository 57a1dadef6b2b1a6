//! Video and audio profile tables
//!
//! A profile is either a fixed argument list or a template with a declared
//! parameter schema. Template parameters are looked up in the user's extra
//! arguments by alias, in order, before falling back to the documented
//! default.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::domain::model::ExtraArgs;
use crate::error::{EncodeError, EncodeResult, ProfileKind};

mod builtin;

/// Reserved video key meaning "do not encode video"
pub const COPY: &str = "copy";
pub const DEFAULT: &str = "default";

/// Ordered encoder arguments produced by a profile
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct OptionArgs(Vec<String>);

impl OptionArgs {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(args.into_iter().map(Into::into).collect())
    }

    pub fn push(&mut self, arg: impl Into<String>) {
        self.0.push(arg.into());
    }

    pub fn extend<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(args.into_iter().map(Into::into));
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Split a user-written option string, honouring double quotes
    pub fn parse(options: &str) -> EncodeResult<Self> {
        let mut args = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut pending = false;

        for ch in options.chars() {
            match ch {
                '"' => {
                    in_quotes = !in_quotes;
                    pending = true;
                }
                c if c.is_whitespace() && !in_quotes => {
                    if pending {
                        args.push(std::mem::take(&mut current));
                        pending = false;
                    }
                }
                c => {
                    current.push(c);
                    pending = true;
                }
            }
        }

        if in_quotes {
            return Err(EncodeError::Config {
                message: format!("unbalanced quotes in options '{}'", options),
            });
        }
        if pending {
            args.push(current);
        }
        Ok(Self(args))
    }
}

/// Space-joined option string; arguments with shell-significant characters are double-quoted
impl fmt::Display for OptionArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|arg| {
                if arg.is_empty() || arg.contains(|c: char| c.is_whitespace() || "|\"&;<>()".contains(c)) {
                    format!("\"{}\"", arg.replace('"', "\\\""))
                } else {
                    arg.clone()
                }
            })
            .collect();
        write!(f, "{}", rendered.join(" "))
    }
}

/// One named template parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    /// Extra-argument keys consulted in order
    pub aliases: &'static [&'static str],
    pub default: &'static str,
}

/// Parameter values after alias lookup and defaulting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParams(BTreeMap<&'static str, String>);

impl TemplateParams {
    fn resolve(schema: &[ParamSpec], extra: &ExtraArgs) -> Self {
        Self(
            schema
                .iter()
                .map(|spec| {
                    let value = spec
                        .aliases
                        .iter()
                        .find_map(|alias| extra.get(*alias))
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| spec.default.to_string());
                    (spec.name, value)
                })
                .collect(),
        )
    }

    /// Value of a declared parameter; undeclared names yield an empty string
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Fixed arguments or a pure function of declared parameters
#[derive(Clone)]
pub enum ProfileTemplate {
    Fixed(OptionArgs),
    Parametrized {
        params: Vec<ParamSpec>,
        build: fn(&TemplateParams) -> OptionArgs,
    },
}

impl fmt::Debug for ProfileTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileTemplate::Fixed(args) => f.debug_tuple("Fixed").field(args).finish(),
            ProfileTemplate::Parametrized { params, .. } => f
                .debug_struct("Parametrized")
                .field("params", params)
                .finish_non_exhaustive(),
        }
    }
}

impl ProfileTemplate {
    fn expand(&self, extra: &ExtraArgs) -> OptionArgs {
        match self {
            ProfileTemplate::Fixed(args) => args.clone(),
            ProfileTemplate::Parametrized { params, build } => {
                build(&TemplateParams::resolve(params, extra))
            }
        }
    }

    fn params(&self) -> &[ParamSpec] {
        match self {
            ProfileTemplate::Fixed(_) => &[],
            ProfileTemplate::Parametrized { params, .. } => params,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AudioProfile {
    pub template: ProfileTemplate,
    /// Extension of the encoder output
    pub extension: String,
}

/// Resolved video intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVideo {
    /// Skip the encode and premux stages
    Copy,
    Encode(OptionArgs),
}

impl ResolvedVideo {
    pub fn is_copy(&self) -> bool {
        matches!(self, ResolvedVideo::Copy)
    }
}

impl fmt::Display for ResolvedVideo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedVideo::Copy => write!(f, "{}", COPY),
            ResolvedVideo::Encode(args) => write!(f, "{}", args),
        }
    }
}

/// Resolved audio intent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAudio {
    pub key: String,
    pub args: OptionArgs,
    pub extension: String,
}

impl ResolvedAudio {
    pub fn is_copy(&self) -> bool {
        self.key == COPY
    }
}

/// Summary row for listing profiles
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    pub kind: &'static str,
    pub key: String,
    pub params: Vec<ParamSpec>,
    pub extension: Option<String>,
}

/// Video and audio profile lookup
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    video: BTreeMap<String, ProfileTemplate>,
    audio: BTreeMap<String, AudioProfile>,
}

impl ProfileTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled NVEnc/libopus profiles
    pub fn builtin() -> Self {
        builtin::table()
    }

    pub fn insert_video(&mut self, key: &str, template: ProfileTemplate) {
        self.video.insert(key.to_string(), template);
    }

    pub fn insert_audio(&mut self, key: &str, template: ProfileTemplate, extension: &str) {
        self.audio.insert(
            key.to_string(),
            AudioProfile {
                template,
                extension: extension.to_string(),
            },
        );
    }

    /// `copy` is always available, stored or not
    pub fn contains_video(&self, key: &str) -> bool {
        key == COPY || self.video.contains_key(key)
    }

    pub fn contains_audio(&self, key: &str) -> bool {
        self.audio.contains_key(key)
    }

    /// Resolve a video profile. `copy` never consults the stored entry.
    pub fn resolve_video(&self, key: &str, extra: &ExtraArgs) -> EncodeResult<ResolvedVideo> {
        if key == COPY {
            return Ok(ResolvedVideo::Copy);
        }

        let template = self.video.get(key).ok_or_else(|| EncodeError::UnknownProfile {
            kind: ProfileKind::Video,
            key: key.to_string(),
        })?;

        let args = template.expand(extra);
        debug!(profile = key, options = %args, "Resolved video profile");
        Ok(ResolvedVideo::Encode(args))
    }

    pub fn resolve_audio(&self, key: &str, extra: &ExtraArgs) -> EncodeResult<ResolvedAudio> {
        let profile = self.audio.get(key).ok_or_else(|| EncodeError::UnknownProfile {
            kind: ProfileKind::Audio,
            key: key.to_string(),
        })?;

        let args = profile.template.expand(extra);
        debug!(profile = key, options = %args, "Resolved audio profile");
        Ok(ResolvedAudio {
            key: key.to_string(),
            args,
            extension: profile.extension.clone(),
        })
    }

    /// Every profile with its parameter schema, video first
    pub fn describe(&self) -> Vec<ProfileInfo> {
        let video = self.video.iter().map(|(key, template)| ProfileInfo {
            kind: "video",
            key: key.clone(),
            params: template.params().to_vec(),
            extension: None,
        });
        let audio = self.audio.iter().map(|(key, profile)| ProfileInfo {
            kind: "audio",
            key: key.clone(),
            params: profile.template.params().to_vec(),
            extension: Some(profile.extension.clone()),
        });
        video.chain(audio).collect()
    }
}
