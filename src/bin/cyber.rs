//! `cyber`: the demo chat bot supervised by `botvisor`.
//!
//! Reads one message per line from stdin, either `user: text` or a bare
//! `text` (user `console`), and prints the reply to stdout. Exits 0 on EOF.

use anyhow::Context;
use botvisor::Responder;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_USER: &str = "console";

fn split_user(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((user, text)) if !user.trim().is_empty() && !user.contains(char::is_whitespace) => {
            (user.trim(), text)
        }
        _ => (DEFAULT_USER, line),
    }
}

/// Answers every line from `input` on `output` until EOF.
///
/// Lines that are not valid UTF-8 are decoded lossily.
async fn serve<R, W>(bot: &mut Responder, mut input: R, mut output: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await.context("reading stdin")? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        if matches!(line, std::borrow::Cow::Owned(_)) {
            warn!(tag = "WARN", "input line is not valid UTF-8, decoding lossily");
        }
        let line = line.trim_end_matches(['\n', '\r']);

        let (user, text) = split_user(line);
        let Some(reply) = bot.handle(user, text, chrono::Local::now()) else {
            continue;
        };
        debug!(user, "replying");
        output
            .write_all(format!("{reply}\n").as_bytes())
            .await
            .context("writing reply")?;
        output.flush().await.context("flushing stdout")?;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    info!(tag = "START", pid = std::process::id(), "cyber bot ready");

    serve(
        &mut Responder::new(),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    info!(tag = "EXIT", "stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_user() {
        assert_eq!(split_user("alice: hello"), ("alice", " hello"));
        assert_eq!(split_user("hello"), ("console", "hello"));
        assert_eq!(split_user("what is 2 + 2: tell me"), ("console", "what is 2 + 2: tell me"));
        assert_eq!(split_user(": hi"), ("console", ": hi"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_stop_the_bot() {
        let input: &[u8] = b"hello\n\xff\xfe bad\n2+2\n";
        let mut out = Vec::new();

        serve(&mut Responder::new(), input, &mut out).await.unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.lines().any(|l| l.ends_with("Math er uttor holo: 4")), "{out}");
    }

    #[tokio::test]
    async fn test_last_line_without_newline_is_answered() {
        let input: &[u8] = b"alice: 3 * 3";
        let mut out = Vec::new();

        serve(&mut Responder::new(), input, &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "🧮 Math er uttor holo: 9\n");
    }
}
