use serde::Deserialize;

/// A validated page request: both `page` (1-indexed) and `count` are positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    count: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct ListSubscribersBody {
    // Missing fields fall back to 0 so they are reported by the bounds check
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub count: i64,
}

impl Pagination {
    pub fn parse(page: i64, count: i64) -> Result<Pagination, String> {
        if page <= 0 || count <= 0 {
            return Err(String::from(
                "page and count fields are required and must be greater than 0",
            ));
        }

        Ok(Self { page, count })
    }

    pub fn limit(&self) -> i64 {
        self.count
    }

    /// Rows to skip. Saturates: a page too far out simply lands past the last row.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.count)
    }
}

impl TryFrom<ListSubscribersBody> for Pagination {
    type Error = String;

    fn try_from(body: ListSubscribersBody) -> Result<Self, Self::Error> {
        Pagination::parse(body.page, body.count)
    }
}
