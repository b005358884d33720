//! Classification of free-form conversation identifiers.

/// How a caller-supplied identifier should be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupKey {
    /// A channel conversation id such as `a:1x2...` or `19:...@thread.v2`.
    ConversationId(String),
    /// A Microsoft Entra (AAD) object id in UUID shape.
    AadObjectId(String),
    /// A conversation or user display name.
    Name(String),
}

const UUID_LEN: usize = 36;

impl LookupKey {
    /// Classifies an identifier. Conversation ids win over AAD ids, and
    /// anything unrecognized is treated as a name.
    pub fn classify(identifier: &str) -> Self {
        if is_conversation_id(identifier) {
            LookupKey::ConversationId(identifier.to_string())
        } else if is_aad_object_id(identifier) {
            LookupKey::AadObjectId(identifier.to_string())
        } else {
            LookupKey::Name(identifier.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LookupKey::ConversationId(s) | LookupKey::AadObjectId(s) | LookupKey::Name(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            LookupKey::ConversationId(_) => "conversation_id",
            LookupKey::AadObjectId(_) => "aad_object_id",
            LookupKey::Name(_) => "name",
        }
    }
}

fn is_conversation_id(identifier: &str) -> bool {
    identifier.chars().count() > UUID_LEN && identifier.contains(':')
}

fn is_aad_object_id(identifier: &str) -> bool {
    identifier.chars().count() == UUID_LEN
        && identifier.chars().position(|c| c == '-') == Some(8)
        && identifier.split('-').count() == 5
}
