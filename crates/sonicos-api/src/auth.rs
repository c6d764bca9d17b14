//! HTTP digest challenge/response.

use digest_auth::{AuthContext, HttpMethod};
use reqwest::StatusCode;
use sonicos_core::client::{HttpReply, HttpRequest, RequestAuth, Transport};
use sonicos_core::config::Credentials;
use sonicos_core::Error;
use tracing::debug;

use crate::Result;

/// How a digest exchange ended.
#[derive(Debug)]
pub(crate) enum DigestExchange {
    /// The first reply was not a 401; no credentials were sent
    Unchallenged(HttpReply),
    /// 401 without a digest challenge; no credentials were sent
    NoChallenge(HttpReply),
    /// Reply to the request carrying the computed `Authorization` header
    Answered(HttpReply),
}

impl DigestExchange {
    pub(crate) fn into_reply(self) -> HttpReply {
        match self {
            Self::Unchallenged(reply) | Self::NoChallenge(reply) | Self::Answered(reply) => reply,
        }
    }
}

fn digest_challenge(reply: &HttpReply) -> Option<&str> {
    reply
        .header_values("www-authenticate")
        .find(|value| value.trim_start().to_ascii_lowercase().starts_with("digest"))
}

/// Send `request`, answering a digest challenge once if one is offered.
pub(crate) async fn send_with_digest(
    transport: &dyn Transport,
    credentials: &Credentials,
    request: HttpRequest,
) -> Result<DigestExchange> {
    let first = transport.send(request.clone()).await?;
    if first.status != StatusCode::UNAUTHORIZED {
        return Ok(DigestExchange::Unchallenged(first));
    }

    let Some(challenge) = digest_challenge(&first) else {
        debug!(url = %request.url, "401 without digest challenge");
        return Ok(DigestExchange::NoChallenge(first));
    };

    let mut prompt = digest_auth::parse(challenge)
        .map_err(|err| Error::AuthError(format!("Malformed digest challenge: {err}")))?;

    let uri = request.request_uri();
    let context = AuthContext::new_with_method(
        credentials.username(),
        credentials.password(),
        uri.as_str(),
        request.body.as_deref(),
        HttpMethod::from(request.method.as_str()),
    );

    let header = prompt
        .respond(&context)
        .map_err(|err| Error::AuthError(format!("Failed to answer digest challenge: {err}")))?
        .to_header_string();

    debug!(url = %request.url, "answering digest challenge");
    let authorized = request.with_auth(RequestAuth::Authorization(header));
    let reply = transport.send(authorized).await?;

    Ok(DigestExchange::Answered(reply))
}
