use serde::Deserialize;

use super::deserializers::deserialize_page;

pub const QUESTIONS_PER_PAGE: usize = 10;

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default, deserialize_with = "deserialize_page")]
    page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

/// Items of the 1-based `page`. Pages below 1 or past the end are empty.
pub fn paginate<T>(items: Vec<T>, page: i64) -> Vec<T> {
    if page < 1 {
        return Vec::new();
    }
    let start = usize::try_from(page - 1)
        .ok()
        .and_then(|p| p.checked_mul(QUESTIONS_PER_PAGE))
        .unwrap_or(usize::MAX);
    items
        .into_iter()
        .skip(start)
        .take(QUESTIONS_PER_PAGE)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_ten_items_wide() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(items.clone(), 1), (1..=10).collect::<Vec<_>>());
        assert_eq!(paginate(items.clone(), 2), (11..=20).collect::<Vec<_>>());
        assert_eq!(paginate(items, 3), vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let items: Vec<u32> = (1..=25).collect();
        assert!(paginate(items.clone(), 4).is_empty());
        assert!(paginate(items.clone(), 0).is_empty());
        assert!(paginate(items.clone(), -3).is_empty());
        assert!(paginate(items, i64::MAX).is_empty());
        assert!(paginate(Vec::<u32>::new(), 1).is_empty());
    }

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(PageQuery::default().page(), 1);
    }
}
