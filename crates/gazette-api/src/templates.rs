//! Server-rendered pages.
//!
//! Templates are compiled into the binary and registered with a single Tera
//! instance at startup. Tera autoescapes every `.html` template.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tera::{Context, Tera};

use crate::error::Error;
use crate::session::SessionUser;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("article.html", include_str!("../templates/article.html")),
    ("not_found.html", include_str!("../templates/not_found.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("setup.html", include_str!("../templates/setup.html")),
    ("admin_list.html", include_str!("../templates/admin_list.html")),
    ("admin_form.html", include_str!("../templates/admin_form.html")),
];

pub fn load() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.iter().copied())?;
    Ok(tera)
}

/// A fresh context carrying the fields `base.html` reads.
pub fn context(current_user: Option<&SessionUser>) -> Context {
    let mut context = Context::new();
    context.insert("current_user", &current_user);
    context
}

pub fn render(tera: &Tera, name: &str, context: &Context) -> Result<Html<String>, Error> {
    Ok(Html(tera.render(name, context)?))
}

pub fn render_with_status(
    tera: &Tera,
    status: StatusCode,
    name: &str,
    context: &Context,
) -> Result<Response, Error> {
    Ok((status, render(tera, name, context)?).into_response())
}

/// The shared 404 page.
pub fn not_found(
    tera: &Tera,
    current_user: Option<&SessionUser>,
    what: &str,
) -> Result<Response, Error> {
    let mut context = context(current_user);
    context.insert("what", what);
    render_with_status(tera, StatusCode::NOT_FOUND, "not_found.html", &context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_compile() {
        let tera = load().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        for (name, _) in TEMPLATES {
            assert!(names.contains(name), "{name} missing");
        }
    }

    #[test]
    fn output_is_escaped() {
        let tera = load().unwrap();
        let response = not_found(&tera, None, "<script>alert(1)</script>").unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let mut context = context(None);
        context.insert("what", "<b>x</b>");
        let Html(body) = render(&tera, "not_found.html", &context).unwrap();
        assert!(body.contains("&lt;b&gt;x&lt;&#x2F;b&gt;"));
        assert!(!body.contains("<b>x</b>"));
    }
}
