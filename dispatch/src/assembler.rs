use crate::client::RawResponse;
use std::fmt;
use std::fmt::Display;

/// A request joined with the response it produced
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRow<R> {
    /// Position within the partition
    pub index: usize,
    pub request: R,
    pub response: RawResponse,
}

/// Pairs each request with its response by position. Responses must come back in request order,
/// one for each.
pub fn attach<R>(requests: Vec<R>, responses: Vec<RawResponse>) -> Result<Vec<AssembledRow<R>>, AssembleError> {
    if requests.len() != responses.len() {
        return Err(AssembleError { requests: requests.len(), responses: responses.len() });
    }

    let rows = requests.into_iter()
        .zip(responses)
        .enumerate()
        .map(|(index, (request, response))| AssembledRow { index, request, response })
        .collect();

    Ok(rows)
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub struct AssembleError {
    pub requests: usize,
    pub responses: usize,
}

impl Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Got {} responses for {} requests", self.responses, self.requests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> RawResponse {
        RawResponse { body: body.into(), status: Some(200), success: true }
    }

    #[test]
    fn test_attach_keeps_order() {
        let rows = attach(vec!["a", "b", "c"], vec![ok("1"), ok("2"), ok("3")]).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].request, "a");
        assert_eq!(rows[2].index, 2);
        assert_eq!(rows[2].response.body, "3");
    }

    #[test]
    fn test_attach_empty() {
        assert!(attach::<&str>(vec![], vec![]).unwrap().is_empty());
    }

    #[test]
    fn test_attach_length_mismatch() {
        let err = attach(vec!["a", "b"], vec![ok("1")]).unwrap_err();
        assert_eq!(err, AssembleError { requests: 2, responses: 1 });
        assert_eq!(err.to_string(), "Got 1 responses for 2 requests");
    }
}
