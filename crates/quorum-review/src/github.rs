use quorum_core::QuorumError;

/// Parse a pull request reference into `(owner, repo, number)`.
///
/// Accepts the short `owner/repo#123` form and full GitHub URLs like
/// `https://github.com/owner/repo/pull/123`.
///
/// # Errors
///
/// Returns [`QuorumError::Config`] when the reference matches neither form.
///
/// # Examples
///
/// ```
/// use quorum_review::github::parse_pr_reference;
///
/// let (owner, repo, number) = parse_pr_reference("rust-lang/rust#12345").unwrap();
/// assert_eq!(owner, "rust-lang");
/// assert_eq!(number, 12345);
///
/// let (owner, _, number) =
///     parse_pr_reference("https://github.com/tokio-rs/tokio/pull/42").unwrap();
/// assert_eq!(owner, "tokio-rs");
/// assert_eq!(number, 42);
/// ```
pub fn parse_pr_reference(reference: &str) -> Result<(String, String, u64), QuorumError> {
    let invalid = || {
        QuorumError::Config(format!(
            "invalid PR reference '{reference}': expected owner/repo#number or a GitHub PR URL"
        ))
    };

    if let Some(rest) = reference
        .strip_prefix("https://github.com/")
        .or_else(|| reference.strip_prefix("http://github.com/"))
    {
        let mut parts = rest.trim_end_matches('/').split('/');
        let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let repo = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        if parts.next() != Some("pull") {
            return Err(invalid());
        }
        let number = parts
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        return Ok((owner.to_string(), repo.to_string(), number));
    }

    let (path, number) = reference.split_once('#').ok_or_else(invalid)?;
    let (owner, repo) = path.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() {
        return Err(invalid());
    }
    let number = number.parse().map_err(|_| invalid())?;
    Ok((owner.to_string(), repo.to_string(), number))
}

/// Minimal GitHub client for fetching pull request diffs.
///
/// Review posting is out of scope; this is a single authenticated GET with
/// the diff media type.
pub struct GitHubClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client. An explicit token wins over the `GITHUB_TOKEN`
    /// environment variable; public repositories work without either.
    pub fn new(token: Option<&str>) -> Self {
        let token = token
            .map(str::to_string)
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());
        Self {
            http: reqwest::Client::new(),
            token,
        }
    }

    /// Fetch the unified diff for a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`QuorumError::Git`] on network or API errors.
    pub async fn get_pr_diff(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<String, QuorumError> {
        let url = format!("https://api.github.com/repos/{owner}/{repo}/pulls/{pr_number}");

        let mut request = self
            .http
            .get(&url)
            .header("Accept", "application/vnd.github.v3.diff")
            .header("User-Agent", "quorum");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| QuorumError::Git(format!("failed to fetch PR diff: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuorumError::Git(format!(
                "GitHub API error {status}: {body}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| QuorumError::Git(format!("failed to read diff response: {e}")))
    }
}
