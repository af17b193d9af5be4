use rand::Rng;
use rand::distr::Alphanumeric;
use url::Url;
use wishwall_types::RoomMode;

/// Query parameter carrying the room id in a page address.
pub const ROOM_PARAM: &str = "room";

/// 62^16 possible ids. Uniqueness is not checked against the backend.
pub const ROOM_ID_LEN: usize = 16;

const RELATIVE_BASE: &str = "http://localhost/";

/// A freshly created room and the address to share for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomLink {
    pub room_id: String,
    pub address: String,
}

fn parse_address(address: &str) -> Option<Url> {
    Url::parse(address)
        .ok()
        .or_else(|| Url::parse(RELATIVE_BASE).ok()?.join(address).ok())
}

/// Work out the room mode from a page address. Absolute URLs and bare
/// relative references (`?room=xyz`) are both accepted; a missing or blank
/// `room` parameter means private mode.
pub fn resolve(address: &str) -> RoomMode {
    parse_address(address)
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == ROOM_PARAM)
                .map(|(_, value)| value.trim().to_string())
        })
        .filter(|room_id| !room_id.is_empty())
        .map(RoomMode::Shared)
        .unwrap_or(RoomMode::Private)
}

pub fn generate_room_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ROOM_ID_LEN)
        .map(char::from)
        .collect()
}

/// Mint a room and embed it in `address`, replacing any room already there.
pub fn create_room(address: &str) -> RoomLink {
    let room_id = generate_room_id();

    let address = match Url::parse(address) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| key != ROOM_PARAM)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            {
                let mut pairs = url.query_pairs_mut();
                pairs.clear();
                for (key, value) in &kept {
                    pairs.append_pair(key, value);
                }
                pairs.append_pair(ROOM_PARAM, &room_id);
            }
            url.to_string()
        }
        Err(_) => format!("?{}={}", ROOM_PARAM, room_id),
    };

    RoomLink { room_id, address }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_private_without_param() {
        assert_eq!(resolve("https://wishes.example.com/"), RoomMode::Private);
        assert_eq!(resolve("https://wishes.example.com/?lang=en"), RoomMode::Private);
        assert_eq!(resolve(""), RoomMode::Private);
    }

    #[test]
    fn test_resolve_shared() {
        assert_eq!(resolve("?room=xyz"), RoomMode::Shared("xyz".into()));
        assert_eq!(
            resolve("https://wishes.example.com/index.html?lang=en&room=abc"),
            RoomMode::Shared("abc".into())
        );
    }

    #[test]
    fn test_resolve_blank_room_is_private() {
        assert_eq!(resolve("?room="), RoomMode::Private);
        assert_eq!(resolve("?room=%20%20"), RoomMode::Private);
    }

    #[test]
    fn test_room_ids() {
        let id = generate_room_id();
        assert_eq!(id.len(), ROOM_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, generate_room_id());
    }

    #[test]
    fn test_create_room_round_trips_through_resolve() {
        let link = create_room("https://wishes.example.com/?lang=en&room=old");
        assert!(link.address.starts_with("https://wishes.example.com/?lang=en&room="));
        assert_eq!(resolve(&link.address), RoomMode::Shared(link.room_id.clone()));
        assert!(!link.address.contains("room=old"));
    }

    #[test]
    fn test_create_room_from_unparseable_address() {
        let link = create_room("not a url");
        assert_eq!(link.address, format!("?room={}", link.room_id));
        assert_eq!(resolve(&link.address), RoomMode::Shared(link.room_id));
    }
}
