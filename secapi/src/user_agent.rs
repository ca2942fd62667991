/// Default `User-Agent` sent when none is configured.
///
/// The upstream index asks automated clients to identify themselves, so the
/// default names the tool and its version rather than impersonating a browser.
pub fn default_user_agent() -> String {
    format!("sec-bullish-monitor/{}", env!("CARGO_PKG_VERSION"))
}
