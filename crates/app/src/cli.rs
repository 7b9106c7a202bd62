use clap::{Parser, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[arg(long, default_value = "api")]
    pub mode: Mode,
    /// Post to harvest; overrides FEELTRACK_POST_URL.
    #[arg(long)]
    pub post_url: Option<String>,
    /// Stop after this many comments; overrides FEELTRACK_MAX_COMMENTS.
    #[arg(long)]
    pub max_comments: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Api,
    Harvest,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Mode};

    #[test]
    fn defaults_to_api() {
        let cli = Cli::parse_from(["feeltrack"]);
        assert_eq!(cli.mode, Mode::Api);
        assert!(cli.post_url.is_none());
    }

    #[test]
    fn harvest_with_overrides() {
        let cli = Cli::parse_from([
            "feeltrack",
            "--mode",
            "harvest",
            "--post-url",
            "https://www.tiktok.com/@a/video/1",
            "--max-comments",
            "500",
        ]);
        assert_eq!(cli.mode, Mode::Harvest);
        assert_eq!(cli.post_url.as_deref(), Some("https://www.tiktok.com/@a/video/1"));
        assert_eq!(cli.max_comments, Some(500));
    }
}
