use std::io::Write;

use ripple_core::Feed;

use crate::error::ServerError;
use crate::protocol::{Command, FeedResponse, Request, Response, ResponseWriter};

/// Execute one request against the feed and emit its response.
///
/// `ADD` always succeeds; `REMOVE` and `CONTAINS` report their outcome in
/// the `success` field. Unrecognized commands produce no response, and
/// `DONE` never gets here (the producer consumes it).
pub fn execute<F, W>(
    feed: &F,
    writer: &ResponseWriter<W>,
    request: Request,
) -> Result<(), ServerError>
where
    F: Feed,
    W: Write,
{
    match request.command {
        Command::Add => {
            feed.add(request.body, request.timestamp);
            writer.write(&Response {
                success: true,
                id: request.id,
            })
        }
        Command::Remove => writer.write(&Response {
            success: feed.remove(request.timestamp),
            id: request.id,
        }),
        Command::Contains => writer.write(&Response {
            success: feed.contains(request.timestamp),
            id: request.id,
        }),
        Command::Feed => writer.write(&FeedResponse {
            id: request.id,
            feed: feed.snapshot(),
        }),
        Command::Done | Command::Unknown => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use ripple_core::{OptimisticFeed, SimpleRwLock};

    use super::*;

    fn request(command: Command, id: i64, body: &str, timestamp: f64) -> Request {
        Request {
            command,
            id,
            body: body.to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_add_then_contains() {
        let feed: OptimisticFeed<SimpleRwLock> = OptimisticFeed::new();
        let writer = ResponseWriter::new(Vec::new());

        execute(&feed, &writer, request(Command::Add, 1, "post", 4.0)).unwrap();
        execute(&feed, &writer, request(Command::Contains, 2, "", 4.0)).unwrap();
        execute(&feed, &writer, request(Command::Contains, 3, "", 5.0)).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], r#"{"success":true,"id":1}"#);
        assert_eq!(lines[1], r#"{"success":true,"id":2}"#);
        assert_eq!(lines[2], r#"{"success":false,"id":3}"#);
    }

    #[test]
    fn test_feed_returns_posts_in_order() {
        let feed: OptimisticFeed<SimpleRwLock> = OptimisticFeed::new();
        let writer = ResponseWriter::new(Vec::new());

        execute(&feed, &writer, request(Command::Add, 1, "old", 1.0)).unwrap();
        execute(&feed, &writer, request(Command::Add, 2, "new", 2.0)).unwrap();
        execute(&feed, &writer, request(Command::Feed, 3, "", 0.0)).unwrap();

        let output = String::from_utf8(writer.into_inner()).unwrap();
        let last = output.lines().last().unwrap();
        let response: FeedResponse = serde_json::from_str(last).unwrap();
        assert_eq!(response.id, 3);
        let bodies: Vec<String> = response.feed.into_iter().map(|p| p.body).collect();
        assert_eq!(bodies, vec!["new", "old"]);
    }

    #[test]
    fn test_unknown_command_is_silent() {
        let feed: OptimisticFeed<SimpleRwLock> = OptimisticFeed::new();
        let writer = ResponseWriter::new(Vec::new());

        execute(&feed, &writer, request(Command::Unknown, 9, "", 0.0)).unwrap();

        assert!(writer.into_inner().is_empty());
    }
}
