use serde::Serialize;

/// Envelope applied to every JSON response the API emits.
///
/// ```json
/// { "success": true, "data": { ... }, "message": "..." }
/// ```
///
/// Success responses carry the operation's payload in `data`; error
/// responses carry `T::default()` there (usually `{}` or `null`) so the
/// shape stays constant for clients. `message` is always a short
/// human-readable summary, e.g. `"Class created successfully"` or
/// `"Class not found"`.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// An error envelope. `T: Default` stands in for the absent payload.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiResponse;
    use serde_json::{Value, json};

    #[test]
    fn error_envelopes_keep_the_shape() {
        let resp = ApiResponse::<Value>::error("Class not found");
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["data"], Value::Null);
        assert_eq!(v["message"], json!("Class not found"));
    }

    #[test]
    fn success_envelopes_carry_the_payload() {
        let resp = ApiResponse::success(json!({ "id": 1 }), "Class fetched successfully");
        let v = serde_json::to_value(&resp).unwrap();
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["data"]["id"], json!(1));
    }
}
