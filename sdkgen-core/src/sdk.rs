//! SDK tags: the identifiers for each generation target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Directory name used for any tag the crate does not know about.
pub const UNKNOWN_DIRECTORY: &str = "unknown";

/// Identifies one generation target (a language flavour, the manifest-driven
/// build, or the API documentation).
///
/// Ordering follows declaration order, which is also the order the registry
/// probes generators in when resolving applicability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SdkTag {
    /// Go message types (`protoc-gen-go`).
    Go,
    /// Go messages plus ConnectRPC client/server stubs.
    GoConnectRpc,
    /// Go messages plus gRPC client/server stubs.
    GoGrpc,
    /// TypeScript via `protoc-gen-es`.
    TypeScriptEs,
    /// Legacy JavaScript, CommonJS imports with binary serialisation.
    TypeScriptCommonJs,
    /// TypeScript messages plus Connect-ES clients.
    TypeScriptConnect,
    /// Whatever the repository's `buf.gen.yaml` declares.
    Buf,
    /// Markdown API documentation.
    Documentation,
    /// A tag registered by an extension.
    Other(String),
}

impl SdkTag {
    /// All built-in tags, in registry probing order.
    pub const BUILTIN: [SdkTag; 8] = [
        SdkTag::Go,
        SdkTag::GoConnectRpc,
        SdkTag::GoGrpc,
        SdkTag::TypeScriptEs,
        SdkTag::TypeScriptCommonJs,
        SdkTag::TypeScriptConnect,
        SdkTag::Buf,
        SdkTag::Documentation,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SdkTag::Go => "go",
            SdkTag::GoConnectRpc => "go-connectrpc",
            SdkTag::GoGrpc => "go-grpc",
            SdkTag::TypeScriptEs => "ts-es",
            SdkTag::TypeScriptCommonJs => "ts-commonjs",
            SdkTag::TypeScriptConnect => "ts-connect",
            SdkTag::Buf => "buf",
            SdkTag::Documentation => "docs",
            SdkTag::Other(name) => name,
        }
    }

    /// Output subdirectory for this tag. Total: unknown tags map to
    /// [`UNKNOWN_DIRECTORY`].
    pub fn directory_name(&self) -> &'static str {
        match self {
            SdkTag::Go => "go",
            SdkTag::GoConnectRpc => "go-connect",
            SdkTag::GoGrpc => "go-grpc",
            SdkTag::TypeScriptEs => "typescript",
            SdkTag::TypeScriptCommonJs => "typescript-commonjs",
            SdkTag::TypeScriptConnect => "typescript-connect",
            SdkTag::Buf => "buf",
            SdkTag::Documentation => "docs",
            SdkTag::Other(_) => UNKNOWN_DIRECTORY,
        }
    }
}

impl fmt::Display for SdkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for SdkTag {
    fn from(s: &str) -> Self {
        SdkTag::BUILTIN
            .iter()
            .find(|tag| tag.as_str() == s)
            .cloned()
            .unwrap_or_else(|| SdkTag::Other(s.to_string()))
    }
}

impl From<String> for SdkTag {
    fn from(s: String) -> Self {
        SdkTag::from(s.as_str())
    }
}

impl From<SdkTag> for String {
    fn from(tag: SdkTag) -> Self {
        tag.as_str().to_string()
    }
}

impl FromStr for SdkTag {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SdkTag::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tags_round_trip_through_strings() {
        for tag in SdkTag::BUILTIN.iter() {
            assert_eq!(&SdkTag::from(tag.as_str()), tag);
        }
    }

    #[test]
    fn unregistered_tag_falls_back_to_unknown_directory() {
        let tag: SdkTag = "kotlin".parse().unwrap();
        assert_eq!(tag, SdkTag::Other("kotlin".into()));
        assert_eq!(tag.directory_name(), UNKNOWN_DIRECTORY);
        assert_eq!(tag.to_string(), "kotlin");
    }
}
