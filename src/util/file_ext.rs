/// Case-insensitive check for a `.ext` suffix.
pub fn has_ext(name: &str, ext: &str) -> bool {
    let Some(dot) = name.rfind('.') else {
        return false;
    };
    name[dot + 1..].eq_ignore_ascii_case(ext)
}

/// Swaps the extension in place when it matches `from`. Returns whether the
/// exchange happened, so call sites can chain alternatives with `||`.
pub fn exchange_ext(name: &mut String, from: &str, to: &str) -> bool {
    if !has_ext(name, from) {
        return false;
    }
    let dot = name.rfind('.').expect("has_ext implies a dot");
    name.truncate(dot + 1);
    name.push_str(to);
    true
}
