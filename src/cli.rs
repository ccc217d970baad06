//! `bookcatalog books ...`: the book list view driven from a terminal against a
//! running server.

use std::io::{self, BufRead, Write};

use anyhow::{Result, bail};

use crate::client::{BooksApi, HttpBooksApi};
use crate::config::BooksCommand;
use crate::model::NewBook;
use crate::views::{Alert, BookListView, Confirm, DeleteOutcome, NavigationView};

/// Reads a yes/no answer from stdin. Anything but "y" or "yes" declines.
/// Needs the multi-threaded runtime `main` starts.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        // Blocking read from inside the runtime.
        tokio::task::block_in_place(|| read_answer(io::stdin().lock(), prompt))
    }
}

fn read_answer<R: BufRead>(mut input: R, prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if input.read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub struct StderrAlert;

impl Alert for StderrAlert {
    fn alert(&mut self, message: &str) {
        eprintln!("error: {message}");
    }
}

pub async fn run_books(url: &str, email: Option<String>, password: Option<String>, action: BooksCommand) -> Result<()> {
    let api = HttpBooksApi::new(url)?;

    let viewer = match (email, password) {
        (Some(email), Some(password)) => Some(api.sign_in(&email, &password).await?),
        (None, None) => None,
        _ => bail!("--email and --password must be given together"),
    };
    let nav = NavigationView::new(viewer.clone());
    eprintln!("{}", nav.render_text());

    let mut list = BookListView::new(viewer);

    match action {
        BooksCommand::List => {
            list.load(&api).await;
            println!("{}", list.render_text());
        }
        BooksCommand::Add { title, author, genre } => {
            let book = api.create(&NewBook::new(&title, &author, &genre)).await?;
            tracing::info!(book_id = %book.id, "book added");
            println!("Added {} ({})", book.title, book.id);
        }
        BooksCommand::Delete { id, yes } => {
            list.load(&api).await;
            let confirm: Box<dyn Confirm> = if yes { Box::new(|_: &str| true) } else { Box::new(StdinConfirm) };
            match list.delete(&api, &id, confirm.as_ref(), &mut StderrAlert).await {
                DeleteOutcome::Deleted => {
                    println!("Deleted {id}");
                    println!();
                    println!("{}", list.render_text());
                }
                DeleteOutcome::Cancelled => println!("Cancelled"),
                DeleteOutcome::Failed => bail!("could not delete {id}"),
            }
        }
    }
    Ok(())
}
