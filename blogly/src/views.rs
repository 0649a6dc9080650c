//! Server-rendered HTML pages.
//!
//! Pages are assembled with `format!`; every piece of user-supplied text goes
//! through [`escape`] first.

use std::borrow::Cow;
use std::fmt::Write as _;

use axum::http::StatusCode;
use blogly_core::User;

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title} | Blogly</title>\n\
         </head>\n\
         <body>\n\
         <nav><a href=\"/users\">Users</a></nav>\n\
         <main>\n{body}</main>\n\
         </body>\n\
         </html>\n",
        title = escape(title),
    )
}

pub fn user_list(users: &[User]) -> String {
    let mut body = String::from("<!-- TESTSTRING_USERS -->\n<h1>Users</h1>\n<ul>\n");
    for user in users {
        let Some(id) = user.id else { continue };
        // Writing into a String cannot fail.
        let _ = writeln!(
            body,
            "<li><a href=\"/users/{id}\">{}</a></li>",
            escape(&user.full_name())
        );
    }
    body.push_str("</ul>\n<a href=\"/users/new\">Add user</a>\n");
    layout("Users", &body)
}

fn user_form(action: &str, submit: &str, first: &str, last: &str, img_url: &str) -> String {
    format!(
        "<form method=\"POST\" action=\"{action}\">\n\
         <label>First name <input name=\"first\" value=\"{first}\" required></label>\n\
         <label>Last name <input name=\"last\" value=\"{last}\" required></label>\n\
         <label>Image URL <input name=\"imgURL\" value=\"{img_url}\"></label>\n\
         <button type=\"submit\">{submit}</button>\n\
         </form>\n",
        first = escape(first),
        last = escape(last),
        img_url = escape(img_url),
    )
}

pub fn new_user_form() -> String {
    let body = format!(
        "<!-- new user test -->\n<h1>Create a user</h1>\n{}",
        user_form("/users/new", "Add", "", "", "")
    );
    layout("New user", &body)
}

pub fn user_detail(user: &User) -> String {
    let id = user.id.unwrap_or_default();
    let body = format!(
        "<h1>{first} {last}</h1>\n\
         <img src=\"{img}\" alt=\"{first} {last}\">\n\
         <dl>\n\
         <dt>First name</dt><dd>{first}</dd>\n\
         <dt>Last name</dt><dd>{last}</dd>\n\
         </dl>\n\
         <a href=\"/users/{id}/edit\">Edit</a>\n\
         <form method=\"POST\" action=\"/users/{id}/delete\">\n\
         <button type=\"submit\">Delete</button>\n\
         </form>\n",
        first = escape(&user.first_name),
        last = escape(&user.last_name),
        img = escape(user.image_url()),
    );
    layout(&user.full_name(), &body)
}

pub fn edit_user_form(user: &User) -> String {
    let id = user.id.unwrap_or_default();
    let body = format!(
        "<h1>Edit {}</h1>\n{}<a href=\"/users/{id}\">Cancel</a>\n",
        escape(&user.full_name()),
        user_form(
            &format!("/users/{id}/edit"),
            "Save",
            &user.first_name,
            &user.last_name,
            user.image_url.as_deref().unwrap_or_default(),
        )
    );
    layout("Edit user", &body)
}

pub fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    let body = format!("<h1>{} {}</h1>\n", status.as_u16(), escape(reason));
    layout(reason, &body)
}
