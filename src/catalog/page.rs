use std::time::Duration;

use url::Url;

use crate::{catalog::PageSource, error::Result, item::Release};

/// Fetches release detail pages straight from the tracker.
pub struct HttpPages {
    agent: ureq::Agent,
}

impl HttpPages {
    pub fn new(connect_timeout: Duration, global_timeout: Duration) -> Self {
        let cfg = ureq::Agent::config_builder()
            .timeout_connect(Some(connect_timeout))
            .timeout_global(Some(global_timeout))
            .build();
        HttpPages {
            agent: ureq::Agent::new_with_config(cfg),
        }
    }
}

impl PageSource for HttpPages {
    fn fetch_detail_page(&self, release: &Release) -> Result<String> {
        let url = Url::parse(release.link.trim())?;
        let body = self
            .agent
            .get(url.as_str())
            .header(
                "User-Agent",
                "Mozilla/5.0 (compatible; kpmatch/0.1)",
            )
            .call()?
            .into_body()
            .read_to_string()?;
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn relative_link_is_an_invalid_url() {
        let pages = HttpPages::new(Duration::from_secs(1), Duration::from_secs(1));
        let release = Release {
            title: "Venom".into(),
            names: vec![],
            year: Some(2018),
            link: "/torrent/1".into(),
        };
        assert!(matches!(
            pages.fetch_detail_page(&release),
            Err(Error::InvalidUrl(_))
        ));
    }
}
