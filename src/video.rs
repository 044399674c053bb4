use regex::Regex;
use std::sync::LazyLock;

use crate::constants::constants;

/// Recognized URL shapes: `youtu.be/<id>`, `/v/<id>`, `/u/<digit>/<id>`, `/embed/<id>`,
/// `watch?v=<id>` and `&v=<id>`. The leading `.*` is greedy, so the last marker wins.
static VIDEO_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
  // Safety: the pattern is a literal; a typo here fails every test in this module.
  Regex::new(r"^.*(youtu\.be/|v/|u/\d/|embed/|watch\?v=|&v=)([^#&?]*).*").expect("video id pattern must compile")
});

/// Extract the canonical video identifier from a user-supplied URL.
///
/// Returns `None` when no marker matches or the token after it is not exactly
/// `video_id_len` characters long.
pub fn extract_video_id(url: &str) -> Option<String> {
  let caps = VIDEO_ID_RE.captures(url)?;
  let id = caps.get(2)?.as_str();
  (id.chars().count() == constants().video_id_len).then(|| id.to_string())
}

/// The embedded player for one video: what a browser iframe would be given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEmbed {
  pub video_id: String,
}

impl VideoEmbed {
  pub fn new(video_id: impl Into<String>) -> Self {
    Self { video_id: video_id.into() }
  }

  /// Player URL with autoplay enabled.
  pub fn embed_url(&self) -> String {
    format!("{}{}?autoplay=1", constants().embed_base, self.video_id)
  }

  pub fn watch_url(&self) -> String {
    format!("{}{}", constants().watch_base, self.video_id)
  }

  /// Permissions granted to the player frame.
  pub fn allow(&self) -> &'static str {
    &constants().embed_allow
  }
}

/// Open a URL in the default browser. The child is reaped on a background thread.
pub fn open_in_browser(url: &str) -> std::io::Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()?;
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const ID: &str = "dQw4w9WgXcQ";

  #[test]
  fn extracts_from_every_recognized_shape() {
    let urls = [
      format!("https://youtu.be/{ID}"),
      format!("https://www.youtube.com/v/{ID}"),
      format!("https://www.youtube.com/u/1/{ID}"),
      format!("https://www.youtube.com/embed/{ID}"),
      format!("https://www.youtube.com/watch?v={ID}"),
      format!("https://www.youtube.com/watch?feature=share&v={ID}"),
    ];
    for url in &urls {
      assert_eq!(extract_video_id(url).as_deref(), Some(ID), "url: {url}");
    }
  }

  #[test]
  fn stops_at_query_and_fragment_delimiters() {
    assert_eq!(extract_video_id(&format!("https://youtu.be/{ID}?t=42")).as_deref(), Some(ID));
    assert_eq!(extract_video_id(&format!("https://www.youtube.com/watch?v={ID}&list=PL1")).as_deref(), Some(ID));
    assert_eq!(extract_video_id(&format!("https://www.youtube.com/watch?v={ID}#t=10")).as_deref(), Some(ID));
  }

  #[test]
  fn rejects_wrong_length_tokens() {
    assert_eq!(extract_video_id("https://youtu.be/short"), None);
    assert_eq!(extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQX"), None);
    assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
  }

  #[test]
  fn rejects_unrecognized_input() {
    assert_eq!(extract_video_id(""), None);
    assert_eq!(extract_video_id("not a url"), None);
    assert_eq!(extract_video_id("https://example.com/watch/dQw4w9WgXcQ"), None);
    assert_eq!(extract_video_id("https://www.youtube.com/u/x/dQw4w9WgXcQ"), None);
  }

  #[test]
  fn embed_urls() {
    let embed = VideoEmbed::new(ID);
    assert_eq!(embed.embed_url(), format!("https://www.youtube.com/embed/{ID}?autoplay=1"));
    assert_eq!(embed.watch_url(), format!("https://www.youtube.com/watch?v={ID}"));
    assert!(embed.allow().contains("clipboard-write"));
  }
}
