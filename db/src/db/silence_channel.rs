use toasty::stmt::Id;

#[derive(Debug)]
#[toasty::model]
pub struct SilenceChannel {
    #[key]
    #[auto]
    pub id: Id<Self>,

    #[unique]
    pub channel_id: String,

    /// Unix timestamp in microseconds.
    pub expires_at: Option<i64>,

    /// JSON array of action names.
    pub disabled_actions: String,

    /// JSON array of command names.
    pub disabled_commands: String,
}
