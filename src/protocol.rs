//! Wire protocol definitions
//!
//! The protocol is plain UTF-8 text over TCP: one logical message per
//! read, up to [`READ_BUFFER_SIZE`] bytes, with no delimiter or length
//! prefix. Control actions ride in-band as sentinel frames matched
//! byte-for-byte against the whole frame.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Maximum bytes consumed per read; one frame never exceeds this
pub const READ_BUFFER_SIZE: usize = 1024;

/// Client-sent frame requesting a voluntary disconnect
pub const QUIT_SENTINEL: &str = "{quit}";

/// Server-sent frame announcing shutdown to every client
pub const END_CONN_SENTINEL: &str = "{end_conn}";

/// First frame sent to every new connection
pub const WELCOME_PROMPT: &str = "Salve! Digita il tuo Nome seguito dal tasto Invio!";

/// Reply to a name claim that collided with a registered name
pub const NAME_TAKEN_PROMPT: &str = "Il nome scelto è già assegnato, inserire un nome diverso:";

/// Personal greeting once a name is granted
pub fn greeting(name: &str) -> String {
    format!(
        "Benvenuto {}! Se vuoi lasciare la Chat, scrivi {} per uscire.",
        name, QUIT_SENTINEL
    )
}

/// System notice broadcast when a session becomes active
pub fn join_announcement(name: &str) -> String {
    format!("{} si è unito alla chat!", name)
}

/// System notice broadcast when an active session quits
pub fn departure_announcement(name: &str) -> String {
    format!("{} ha abbandonato la Chat.", name)
}

/// A chat message as relayed to every session
pub fn relayed(name: &str, body: &str) -> String {
    format!("{}: {}", name, body)
}

/// Read one frame from the connection
///
/// Returns `Ok(None)` on a clean EOF (the peer closed its write side).
/// Bytes are decoded lossily; the protocol has no escaping, so whatever
/// arrives in one read is one frame.
pub async fn read_frame<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    let n = reader.read(&mut buf).await?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::AsyncWriteExt;

    #[test]
    fn test_sentinels_exact() {
        assert_eq!(QUIT_SENTINEL, "{quit}");
        assert_eq!(END_CONN_SENTINEL, "{end_conn}");
    }

    #[test]
    fn test_greeting_mentions_quit_sentinel() {
        let text = greeting("Ana");
        assert!(text.starts_with("Benvenuto Ana!"));
        assert!(text.contains("{quit}"));
    }

    #[test]
    fn test_relayed_attribution() {
        assert_eq!(relayed("Ana", "hello"), "Ana: hello");
    }

    #[test]
    fn test_announcements() {
        assert_eq!(join_announcement("Ana"), "Ana si è unito alla chat!");
        assert_eq!(departure_announcement("Ana"), "Ana ha abbandonato la Chat.");
    }

    #[tokio::test]
    async fn test_read_frame_returns_one_message() {
        let (mut client, mut server) = tokio::io::duplex(READ_BUFFER_SIZE);
        client.write_all("ciao a tutti".as_bytes()).await.unwrap();

        let frame = read_frame(&mut server).await.unwrap();
        assert_eq!(frame.as_deref(), Some("ciao a tutti"));
    }

    #[tokio::test]
    async fn test_read_frame_eof() {
        let (client, mut server) = tokio::io::duplex(READ_BUFFER_SIZE);
        drop(client);

        let frame = read_frame(&mut server).await.unwrap();
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn test_read_frame_caps_at_buffer_size() {
        let (mut client, mut server) = tokio::io::duplex(READ_BUFFER_SIZE * 2);
        let oversized = "a".repeat(READ_BUFFER_SIZE + 100);
        client.write_all(oversized.as_bytes()).await.unwrap();

        let frame = read_frame(&mut server).await.unwrap().unwrap();
        assert!(frame.len() <= READ_BUFFER_SIZE);
    }
}
