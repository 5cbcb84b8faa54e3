/// Render a message template, e.g.
/// `msg!(MESSAGES.archive_success, name = "Atlas", moved = 6, voice_deleted = 1)`.
#[macro_export]
macro_rules! msg {
    ($template:expr) => {
        $crate::MessageBuilder::new($template).build()
    };
    ($template:expr, $($key:ident = $value:expr),+ $(,)?) => {
        $crate::MessageBuilder::new($template)
            $(.var(stringify!($key), $value))+
            .build()
    };
}
