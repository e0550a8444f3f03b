//! Presentation side of the observation contract
//!
//! A [`Presenter`] renders the four observable values. [`pump`] drives one
//! from a session subscription until the session goes away.

use crate::client::FetchError;
use crate::controller::SearchEvent;
use crate::core::Message;
use crate::types::Product;
use std::io::{self, Write};
use tokio::sync::mpsc;

pub trait Presenter {
    fn render_results(&mut self, results: &[Product]) -> io::Result<()>;
    fn render_searching(&mut self, searching: bool) -> io::Result<()>;
    fn render_history(&mut self, history: &[String]) -> io::Result<()>;
    fn render_error(&mut self, error: Option<&FetchError>) -> io::Result<()>;

    fn apply(&mut self, event: &SearchEvent) -> io::Result<()> {
        match event {
            SearchEvent::ResultsChanged(results) => self.render_results(results),
            SearchEvent::SearchingChanged(searching) => self.render_searching(*searching),
            SearchEvent::HistoryChanged(history) => self.render_history(history),
            SearchEvent::ErrorChanged(error) => self.render_error(error.as_ref()),
        }
    }
}

/// Plain line-oriented output.
pub struct TerminalPresenter<W: Write> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render_results(&mut self, results: &[Product]) -> io::Result<()> {
        writeln!(self.out, "-- {} results --", results.len())?;
        for (index, product) in results.iter().enumerate() {
            write!(self.out, "{:>4}. {}  {}", index + 1, product.name, product.price)?;
            if let Some(image_url) = &product.image_url {
                write!(self.out, "  <{}>", image_url)?;
            }
            writeln!(self.out)?;
        }
        self.out.flush()
    }

    fn render_searching(&mut self, searching: bool) -> io::Result<()> {
        if searching {
            writeln!(self.out, "searching...")?;
        }
        self.out.flush()
    }

    fn render_history(&mut self, history: &[String]) -> io::Result<()> {
        if history.is_empty() {
            writeln!(self.out, "-- history empty --")?;
        } else {
            writeln!(self.out, "-- history --")?;
            for (index, entry) in history.iter().enumerate() {
                writeln!(self.out, "{:>4}. {}", index, entry)?;
            }
        }
        self.out.flush()
    }

    fn render_error(&mut self, error: Option<&FetchError>) -> io::Result<()> {
        if let Some(error) = error {
            writeln!(self.out, "error: {}", error)?;
        }
        self.out.flush()
    }
}

/// Render every event until the channel closes.
pub async fn pump<P: Presenter>(
    mut receiver: mpsc::UnboundedReceiver<Message<SearchEvent>>,
    presenter: &mut P,
) {
    while let Some(message) = receiver.recv().await {
        if let Err(e) = presenter.apply(&message.payload) {
            log::warn!("Failed to render {}: {}", message.method, e);
        }
    }
    log::debug!("Event stream closed, presenter stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(presenter: TerminalPresenter<Vec<u8>>) -> String {
        String::from_utf8(presenter.into_inner()).unwrap()
    }

    #[test]
    fn test_results_are_numbered() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        let results = vec![
            Product::new("Whole Milk", "$3.49").with_image("https://img/milk.png"),
            Product::new("Oat Milk", "$4.99"),
        ];
        presenter.apply(&SearchEvent::ResultsChanged(results)).unwrap();

        assert_eq!(
            rendered(presenter),
            concat!(
                "-- 2 results --\n",
                "   1. Whole Milk  $3.49  <https://img/milk.png>\n",
                "   2. Oat Milk  $4.99\n",
            )
        );
    }

    #[test]
    fn test_idle_searching_and_cleared_error_render_nothing() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter.apply(&SearchEvent::SearchingChanged(false)).unwrap();
        presenter.apply(&SearchEvent::ErrorChanged(None)).unwrap();
        assert!(rendered(presenter).is_empty());
    }

    #[test]
    fn test_history_indices_match_pick_command() {
        let mut presenter = TerminalPresenter::new(Vec::new());
        presenter
            .apply(&SearchEvent::HistoryChanged(vec!["bread".into(), "milk".into()]))
            .unwrap();
        assert_eq!(rendered(presenter), "-- history --\n   0. bread\n   1. milk\n");
    }

    #[tokio::test]
    async fn test_pump_renders_until_closed() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(SearchEvent::SearchingChanged(true).into_message()).unwrap();
        tx.send(
            SearchEvent::ErrorChanged(Some(FetchError::Network("offline".into()))).into_message(),
        )
        .unwrap();
        drop(tx);

        let mut presenter = TerminalPresenter::new(Vec::new());
        pump(rx, &mut presenter).await;
        assert_eq!(rendered(presenter), "searching...\nerror: network error: offline\n");
    }
}
