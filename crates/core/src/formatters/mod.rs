pub mod markdown;
pub mod transcript;

#[cfg(feature = "markdown")]
pub use markdown::HtmdConverter;
pub use markdown::{CodeBlockStyle, GfmExtension, HeadingStyle, LinkStyle, MarkdownConverter, MarkdownOptions};
pub use markdown::{html_to_markdown, remove_images};
pub use transcript::{VideoInfo, format_youtube_transcript};
