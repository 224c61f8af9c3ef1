use serde::{Deserialize, Serialize};

/// Token tagging one render request and every event it produces.
///
/// Rendered as `"{channel}.{seq}"` on the wire. Within one channel a larger
/// `seq` always means a newer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RenderId {
    pub channel: u32,
    pub seq: u64,
}

impl RenderId {
    pub const fn new(channel: u32, seq: u64) -> Self {
        Self { channel, seq }
    }
}

impl std::fmt::Display for RenderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.channel, self.seq)
    }
}

impl std::str::FromStr for RenderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (channel, seq) = s
            .split_once('.')
            .ok_or_else(|| format!("render id must look like <channel>.<seq>: {s:?}"))?;
        let channel = channel.parse().map_err(|e| format!("render id channel: {e}"))?;
        let seq = seq.parse().map_err(|e| format!("render id sequence: {e}"))?;
        Ok(Self { channel, seq })
    }
}

impl TryFrom<String> for RenderId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RenderId> for String {
    fn from(id: RenderId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::RenderId;

    #[test]
    fn displays_and_parses() {
        let id = RenderId::new(3, 17);
        assert_eq!(id.to_string(), "3.17");
        assert_eq!("3.17".parse::<RenderId>(), Ok(id));
        assert!("317".parse::<RenderId>().is_err());
        assert!("a.1".parse::<RenderId>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let id = RenderId::new(0, 2);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0.2\"");
        let back: RenderId = serde_json::from_str("\"0.2\"").unwrap();
        assert_eq!(back, id);
        assert!(RenderId::new(0, 3) > id);
    }
}
