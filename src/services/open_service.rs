use crate::error::AppError;

/// Decodes a shared link, or a bare token, into the photo URLs it carries
pub fn open_link(link: &str) -> Result<Vec<String>, AppError> {
    let urls = share_pipeline::open_shared(link.trim())?;
    log::info!("Shared link contains {} photos", urls.len());
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_link_and_token() {
        let expected = vec!["https://host/a".to_string(), "https://host/b".to_string()];
        let token = "WyJodHRwczovL2hvc3QvYSIsImh0dHBzOi8vaG9zdC9iIl0";

        assert_eq!(open_link(token).unwrap(), expected);
        assert_eq!(
            open_link(&format!("https://tree.example.com/?data={}\n", token)).unwrap(),
            expected
        );
    }

    #[test]
    fn test_open_broken_link() {
        let err = open_link("https://tree.example.com/?data=bm9wZQ").unwrap_err();
        assert!(matches!(
            err,
            AppError::Share(share_pipeline::ShareError::MalformedShareToken(_))
        ));
        assert_eq!(err.user_message(), "This share link is broken.");
    }
}
