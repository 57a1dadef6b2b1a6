//! Path helpers for the canonical forward-slash form used in plans

/// Replace every backslash with a forward slash
pub fn canonical(path: &str) -> String {
    path.replace('\\', "/")
}

/// Canonical directory path with exactly one trailing slash
pub fn canonical_dir(path: &str) -> String {
    let mut clean = canonical(path.trim());
    if clean.is_empty() {
        return "./".to_string();
    }
    while clean.len() > 1 && clean.ends_with("//") {
        clean.pop();
    }
    if !clean.ends_with('/') {
        clean.push('/');
    }
    clean
}

/// Rewrite an MSYS-style `/c/dir` path to `C:/dir`
pub fn from_msys(path: &str) -> String {
    let clean = canonical(path);
    let bytes = clean.as_bytes();
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b'/' {
        let drive = (bytes[1] as char).to_ascii_uppercase();
        return format!("{}:/{}", drive, &clean[3..]);
    }
    clean
}

/// Final path component of a canonical path
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// File name without its last extension
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}

/// Lower-cased extension of the final component, if any
pub fn extension(path: &str) -> Option<String> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(dot) => Some(name[dot + 1..].to_lowercase()),
    }
}

/// `<stem><suffix>.<ext>` for the file name of `path`
pub fn swap_ext(path: &str, ext: &str, suffix: &str) -> String {
    format!("{}{}.{}", file_stem(path), suffix, ext)
}

/// Backslash form for Windows script targets
pub fn to_windows(path: &str) -> String {
    path.replace('/', "\\")
}
