//! View models and their HTML.
//!
//! Views hold the UI state the browser script mirrors (list state, menu
//! state) and render it. Anything that would block on a person, such as
//! "are you sure?", comes in through [`Confirm`] and [`Alert`] so the state
//! machines can be driven from tests or a terminal.

mod book_list;
mod forms;
mod navigation;

pub use book_list::*;
pub use forms::*;
pub use navigation::*;

/// A blocking yes/no question.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Surfaces a failure to the person without blocking the view.
pub trait Alert: Send {
    fn alert(&mut self, message: &str);
}

impl Alert for Vec<String> {
    fn alert(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wraps a page body in the shared document shell.
pub fn page(title: &str, nav: &NavigationView, main: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
    <head>
        <meta charset="utf-8">
        <meta name="viewport" content="width=device-width, initial-scale=1">
        <title>{title}</title>
        <link rel="stylesheet" href="/static/app.css">
        <script src="/static/app.js" defer></script>
    </head>
    <body>
        {nav}
        <main class="container">
            {main}
        </main>
    </body>
</html>
"#,
        title = escape(title),
        nav = nav.render_html(),
        main = main,
    )
}
