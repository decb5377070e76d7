use serde::Serialize;

/// Envelope for every JSON body the API returns.
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Event created successfully"
/// }
/// ```
///
/// Errors carry `T::default()` as `data`, so handlers pick a `Default` payload type.
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

/// Placeholder payload for responses that carry no data.
#[derive(Debug, Serialize, Default)]
pub struct Empty;
