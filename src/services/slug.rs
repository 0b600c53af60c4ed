/// URL-friendly form of a name: lower-case ASCII alphanumerics joined by single dashes.
///
/// `"Devworks Bootcamp"` becomes `"devworks-bootcamp"`; `"UI/UX  & Co."` becomes `"ui-ux-co"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}
