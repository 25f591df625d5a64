//! Inline HTML for the login flow pages.

const STYLE: &str = "body{font-family:sans-serif;max-width:32rem;margin:3rem auto;padding:0 1rem}\
.error{color:#b00020}.tiles span{display:inline-block;border:1px solid #888;padding:.5rem 1rem;margin:.25rem}";

/// Escape text for HTML element and attribute content.
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn csrf_field(csrf_token: &str) -> String {
    format!(
        "<input type=\"hidden\" name=\"csrf_token\" value=\"{}\">",
        escape_html(csrf_token)
    )
}

fn logout_form(csrf_token: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/logout/\">{}<button type=\"submit\">Log out</button></form>",
        csrf_field(csrf_token)
    )
}

pub(crate) fn index() -> String {
    layout(
        "Home",
        "<h1>Welcome</h1>\n<p><a href=\"/login/\">Log in</a></p>",
    )
}

pub(crate) fn login(csrf_token: &str, username: &str, failed: bool) -> String {
    let error = if failed {
        "<p class=\"error\">Please enter a correct username and password.</p>\n"
    } else {
        ""
    };
    let body = format!(
        "<h1>Log in</h1>\n{error}<form method=\"post\" action=\"/login/\">\n{csrf}\n\
         <p><label>Username <input type=\"text\" name=\"username\" value=\"{username}\" autofocus required></label></p>\n\
         <p><label>Password <input type=\"password\" name=\"password\" required></label></p>\n\
         <p><button type=\"submit\">Log in</button></p>\n</form>",
        csrf = csrf_field(csrf_token),
        username = escape_html(username),
    );
    layout("Log in", &body)
}

pub(crate) fn captcha(csrf_token: &str, tiles: &[&str]) -> String {
    let tiles = tiles
        .iter()
        .map(|tile| format!("<span>{}</span>", escape_html(tile)))
        .collect::<String>();
    let body = format!(
        "<h1>Verify</h1>\n<p>Enter the tiles in order, separated by commas.</p>\n\
         <div class=\"tiles\">{tiles}</div>\n<form method=\"post\" action=\"/check-captcha/\">\n{csrf}\n\
         <p><input type=\"text\" name=\"order\" autocomplete=\"off\" required></p>\n\
         <p><button type=\"submit\">Continue</button></p>\n</form>",
        csrf = csrf_field(csrf_token),
    );
    layout("Verify", &body)
}

pub(crate) fn welcome(username: Option<&str>, csrf_token: &str) -> String {
    let body = match username {
        Some(name) => format!(
            "<h1>Welcome, {}!</h1>\n{}",
            escape_html(name),
            logout_form(csrf_token)
        ),
        None => "<h1>Welcome!</h1>".to_string(),
    };
    layout("Welcome", &body)
}

pub(crate) fn admin(username: &str, csrf_token: &str) -> String {
    let body = format!(
        "<h1>Site administration</h1>\n<p>Signed in as {}.</p>\n{}",
        escape_html(username),
        logout_form(csrf_token)
    );
    layout("Site administration", &body)
}

pub(crate) fn forbidden() -> String {
    layout(
        "Forbidden",
        "<h1>Forbidden (403)</h1>\n<p>CSRF verification failed. Request aborted.</p>",
    )
}

pub(crate) fn not_found() -> String {
    layout("Not Found", "<h1>Not Found</h1>")
}

pub(crate) fn server_error() -> String {
    layout("Server Error", "<h1>Server Error (500)</h1>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#x27;&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn login_page_keeps_username_escaped() {
        let page = login("tok", "<alice>", true);
        assert!(page.contains("value=\"&lt;alice&gt;\""));
        assert!(page.contains("Please enter a correct username and password."));
        assert!(page.contains("name=\"csrf_token\" value=\"tok\""));
    }

    #[test]
    fn login_page_without_error() {
        assert!(!login("tok", "", false).contains("class=\"error\""));
    }

    #[test]
    fn captcha_page_lists_tiles_and_order_field() {
        let page = captcha("tok", &["3", "1", "4", "2"]);
        assert!(page.contains("<span>3</span><span>1</span><span>4</span><span>2</span>"));
        assert!(page.contains("name=\"order\""));
        assert!(page.contains("action=\"/check-captcha/\""));
    }

    #[test]
    fn welcome_page_greets_known_user() {
        assert!(welcome(Some("alice"), "tok").contains("Welcome, alice!"));
        assert!(!welcome(None, "").contains("Log out"));
    }
}
