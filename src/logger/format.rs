//! Access log line formatting.
//!
//! The `log.access_log_format` setting selects one of the named formats
//! (`combined`, `common`, `json`) or is treated as a custom pattern with
//! `$variable` substitution.

use chrono::Local;

/// One request/response pair, as recorded for the access log.
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Peer IP address.
    pub remote_addr: String,
    /// Timestamp taken when the request arrived.
    pub time: chrono::DateTime<Local>,
    /// Request method.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Query string, without the leading `?`.
    pub query: Option<String>,
    /// HTTP version label (1.0, 1.1, 2).
    pub http_version: String,
    /// Status code of the response.
    pub status: u16,
    /// Bytes in the response body.
    pub body_bytes: usize,
    /// Referer header, when the client sent one.
    pub referer: Option<String>,
    /// User-Agent header, when the client sent one.
    pub user_agent: Option<String>,
    /// Time spent handling the request, in microseconds.
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Create an entry stamped with the current local time.
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Render the entry in the given format.
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    /// Timestamp in Common Log Format notation.
    fn clf_time(&self) -> String {
        self.time.format("%d/%b/%Y:%H:%M:%S %z").to_string()
    }

    /// Path plus query string, as the client sent it.
    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// Full request line, `METHOD /path HTTP/version`.
    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.request_uri(), self.http_version)
    }

    /// Nginx combined format: the common line plus quoted referer and
    /// user agent.
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" \"{}\"",
            self.format_common(),
            self.referer.as_deref().unwrap_or("-"),
            self.user_agent.as_deref().unwrap_or("-"),
        )
    }

    /// Common Log Format,
    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`.
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.clf_time(),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    /// One JSON object per line; absent optional fields render as null.
    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }

    /// Substitute `$variable` occurrences in a custom pattern.
    ///
    /// Supported: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$status`,
    /// `$body_bytes_sent`, `$http_referer`, `$http_user_agent`, and
    /// `$request_time` (seconds, three decimal places).
    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let seconds = self.request_time_us as f64 / 1_000_000.0;

        // The longer $request_* variables must be replaced before plain
        // $request, which is a prefix of all of them.
        pattern
            .replace("$remote_addr", &self.remote_addr)
            .replace("$time_local", &self.clf_time())
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_time", &format!("{seconds:.3}"))
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.request_uri())
            .replace("$request", &self.request_line())
            .replace("$status", &self.status.to_string())
            .replace("$body_bytes_sent", &self.body_bytes.to_string())
            .replace("$http_referer", self.referer.as_deref().unwrap_or("-"))
            .replace("$http_user_agent", self.user_agent.as_deref().unwrap_or("-"))
    }
}
