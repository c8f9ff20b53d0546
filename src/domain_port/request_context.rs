/// The inbound request as seen by the session authority.
pub trait RequestContext: Send + Sync {
    /// Token carried by the request: the header named `token_name` first,
    /// then a cookie of the same name. Blank values count as absent.
    fn current_token(&self, token_name: &str) -> Option<String>;

    /// Hand a freshly issued token back to the client.
    fn attach_token(&self, token_name: &str, token: &str);
}
