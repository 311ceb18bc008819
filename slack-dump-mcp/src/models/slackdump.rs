use serde::{Deserialize, Deserializer};

// slackdump writes empty Go slices and strings as `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default, alias = "Text", deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, alias = "User")]
    pub user: Option<String>,
    #[serde(default, alias = "BotID")]
    pub bot_id: Option<String>,
    #[serde(default, alias = "Username")]
    pub username: Option<String>,
}

impl Message {
    /// Identifier of whoever posted the message: the user, else the bot.
    pub fn sender_id(&self) -> Option<&str> {
        self.user
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| self.bot_id.as_deref().filter(|id| !id.is_empty()))
    }
}

/// One thread as exported by `slackdump dump`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Conversation {
    #[serde(default, alias = "Messages", deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
}
