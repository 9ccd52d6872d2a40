//! Playback target for one clip: where the player should open and from which second.

use anyhow::{Context, Result};
use reqwest::Url;

use crate::backend::VideoRef;
use crate::constants::constants;

/// Playback start in whole seconds for a clip whose subtitle start is `start` (1-based).
///
/// Subtract first, floor second. Starts below 1.0 produce a negative offset (`0.4 -> -1`);
/// the value is passed through unchanged and callers decide what a negative start means.
pub fn start_offset(start: f64) -> i64 {
  (start - 1.0).floor() as i64
}

/// Everything the video widget needs to show one clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedTarget {
  pub video_id: String,
  pub start: i64,
  pub autoplay: bool,
  pub captions: bool,
  pub lang: String,
}

impl EmbedTarget {
  /// Target for `video` with autoplay and captions on, subtitles and UI in `lang`.
  pub fn for_video(video: &VideoRef, lang: &str) -> Self {
    Self {
      video_id: video.id.clone(),
      start: start_offset(video.start),
      autoplay: true,
      captions: true,
      lang: lang.to_string(),
    }
  }

  /// Embeddable player URL, e.g.
  /// `https://www.youtube.com/embed/abc?start=4&enablejsapi=1&cc_load_policy=1&cc_lang_pref=zh&hl=zh&autoplay=1`
  pub fn embed_url(&self) -> Result<Url> {
    let base = format!("{}/{}", constants().embed_base_url.trim_end_matches('/'), self.video_id);
    let mut url = Url::parse(&base).with_context(|| format!("Invalid embed URL for video {}", self.video_id))?;
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("start", &self.start.to_string());
      query.append_pair("enablejsapi", "1");
      if self.captions {
        query.append_pair("cc_load_policy", "1");
        query.append_pair("cc_lang_pref", &self.lang);
      }
      query.append_pair("hl", &self.lang);
      if self.autoplay {
        query.append_pair("autoplay", "1");
      }
    }
    Ok(url)
  }

  /// Regular watch page URL, used to hand the clip to mpv.
  pub fn watch_url(&self) -> Result<Url> {
    let mut url = Url::parse(&constants().watch_base_url).context("Invalid watch base URL")?;
    url.query_pairs_mut().append_pair("v", &self.video_id);
    Ok(url)
  }
}
