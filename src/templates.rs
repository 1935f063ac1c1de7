use crate::error::Result;
use handlebars::Handlebars;

/// Page templates, registered under their route names
const PAGES: [(&str, &str); 8] = [
    ("welcome", include_str!("./static/welcome.html")),
    ("sign_up", include_str!("./static/sign_up.html")),
    ("login", include_str!("./static/login.html")),
    ("upload", include_str!("./static/upload.html")),
    ("settings", include_str!("./static/settings.html")),
    ("chat", include_str!("./static/chat.html")),
    ("report", include_str!("./static/report.html")),
    ("dashboard", include_str!("./static/dashboard.html")),
];

const PARTIALS: [(&str, &str); 2] = [
    ("header", include_str!("./static/header.html")),
    ("footer", include_str!("./static/footer.html")),
];

/// Builds the template registry with every page and partial compiled in
pub fn registry() -> Result<Handlebars<'static>> {
    let mut handlebars = Handlebars::new();

    for (name, source) in PARTIALS {
        handlebars.register_partial(name, source)?;
    }
    for (name, source) in PAGES {
        handlebars.register_template_string(name, source)?;
    }

    Ok(handlebars)
}
