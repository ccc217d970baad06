use super::escape;
use crate::model::NewBook;

fn error_banner(error: Option<&str>) -> String {
    match error {
        Some(msg) => format!(r#"<p class="error" role="alert">{}</p>"#, escape(msg)),
        None => String::new(),
    }
}

/// The add-book form, refilled with what was submitted when it comes back with an error.
pub fn add_book_form(values: &NewBook, error: Option<&str>) -> String {
    format!(
        r#"<section class="panel">
            <h1>Add a Book</h1>
            {error}
            <form method="post" action="/add" class="stacked">
                <label>Title <input name="title" required value="{title}"></label>
                <label>Author <input name="author" required value="{author}"></label>
                <label>Genre <input name="genre" required value="{genre}"></label>
                <button type="submit" class="button">Add Book</button>
            </form>
        </section>"#,
        error = error_banner(error),
        title = escape(&values.title),
        author = escape(&values.author),
        genre = escape(&values.genre),
    )
}

pub fn sign_in_forms(email: &str, error: Option<&str>, google_enabled: bool) -> String {
    let google_note = if google_enabled {
        r#"<p class="muted">Google sign-in is configured for this deployment.</p>"#
    } else {
        ""
    };

    format!(
        r#"<section class="panel">
            <h1>Sign In</h1>
            {error}
            <form method="post" action="/signin" class="stacked">
                <label>Email <input type="email" name="email" required value="{email}"></label>
                <label>Password <input type="password" name="password" required></label>
                <button type="submit" class="button">Sign In</button>
            </form>
            {google_note}
        </section>
        <section class="panel">
            <h2>Create an account</h2>
            <form method="post" action="/register" class="stacked">
                <label>Name <input name="name"></label>
                <label>Email <input type="email" name="email" required></label>
                <label>Password <input type="password" name="password" minlength="8" required></label>
                <button type="submit" class="button">Register</button>
            </form>
        </section>"#,
        error = error_banner(error),
        email = escape(email),
        google_note = google_note,
    )
}
