use std::fmt;

use crate::error::CoreError;

const VIDEO_SEGMENT: &str = "video";

/// A post reference extracted from a share URL such as
/// `https://www.tiktok.com/@someone/video/7424737284664184070?lang=es`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostUrl {
    post_id: String,
    author: Option<String>,
}

impl PostUrl {
    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

impl TryFrom<&str> for PostUrl {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let path = path_from_url(trimmed)
            .ok_or_else(|| CoreError::InvalidPostUrl(trimmed.to_string()))?;
        let segments: Vec<&str> = path.split('/').collect();
        let video_idx = segments
            .iter()
            .position(|segment| *segment == VIDEO_SEGMENT)
            .ok_or_else(|| CoreError::InvalidPostUrl(format!("{trimmed}: missing /video/ segment")))?;
        let post_id = segments
            .get(video_idx + 1)
            .map(|segment| segment.trim())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| CoreError::InvalidPostUrl(format!("{trimmed}: missing post id")))?;
        let author = segments
            .iter()
            .find_map(|segment| segment.strip_prefix('@'))
            .filter(|handle| !handle.is_empty())
            .map(|handle| handle.to_string());
        Ok(PostUrl {
            post_id: post_id.to_string(),
            author,
        })
    }
}

impl fmt::Display for PostUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.author {
            Some(author) => write!(f, "@{author}/video/{}", self.post_id),
            None => write!(f, "video/{}", self.post_id),
        }
    }
}

/// Returns the identifier following the `video` path segment.
pub fn extract_post_id(url: &str) -> Result<String, CoreError> {
    PostUrl::try_from(url).map(|post| post.post_id)
}

fn path_from_url(url: &str) -> Option<&str> {
    let path = if let Some(scheme_idx) = url.find("://") {
        let rest = &url[scheme_idx + 3..];
        let path_idx = rest.find('/')?;
        &rest[path_idx..]
    } else {
        url
    };
    let path = path.split(['?', '#']).next()?.trim();
    if path.is_empty() { None } else { Some(path) }
}
