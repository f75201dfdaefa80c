use crate::{
    data::student::Student,
    error::{InvalidPageParamSnafu, InvalidSortSnafu, SchoolResult},
};
use snafu::{OptionExt, ensure};
use std::cmp::Ordering;

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_PAGE_SIZE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Name,
}

impl SortField {
    fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            _ => None,
        }
    }

    /// Column backing this field. Only these whitelisted names ever reach SQL.
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
        }
    }

    fn compare(self, a: &Student, b: &Student) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            // case-folded first, closer to how postgres collations order text
            Self::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("asc") {
            Some(Self::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(Self::Desc)
        } else {
            None
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: Direction,
}

impl SortOrder {
    /// Parses one `sort` value: `field(,field)*` optionally followed by
    /// `,asc` or `,desc`, which then applies to every field before it.
    /// Empty items are skipped.
    fn parse_all(raw: &str) -> SchoolResult<Vec<Self>> {
        let mut items: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect();

        let direction = match items.last().and_then(|last| Direction::parse(last)) {
            Some(direction) => {
                items.pop();
                direction
            }
            None => Direction::default(),
        };
        ensure!(!items.is_empty(), InvalidSortSnafu { found: raw });

        let mut orders = Vec::with_capacity(items.len());
        for field in items {
            let field = SortField::parse(field).context(InvalidSortSnafu { found: raw })?;
            orders.push(Self { field, direction });
        }
        Ok(orders)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pageable {
    pub page: u32,
    pub size: u32,
    pub sort: Vec<SortOrder>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_PAGE_SIZE,
            sort: vec![],
        }
    }
}

impl Pageable {
    /// Builds a page request from raw query pairs. `page` and `size` may appear
    /// at most once (the last one wins), `sort` may repeat. Sizes over
    /// `max_size` are clamped. Unrelated parameters are ignored.
    pub fn from_query_pairs(pairs: &[(String, String)], max_size: u32) -> SchoolResult<Self> {
        let mut pageable = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    pageable.page = value.trim().parse().ok().context(InvalidPageParamSnafu {
                        name: "page",
                        found: value,
                    })?;
                }
                "size" => {
                    let size: u32 = value.trim().parse().ok().context(InvalidPageParamSnafu {
                        name: "size",
                        found: value,
                    })?;
                    ensure!(
                        size > 0,
                        InvalidPageParamSnafu {
                            name: "size",
                            found: value,
                        }
                    );
                    pageable.size = size.min(max_size.max(1));
                }
                "sort" => {
                    // blank sorts are ignored
                    if !value.trim().is_empty() {
                        pageable.sort.extend(SortOrder::parse_all(value)?);
                    }
                }
                _ => {}
            }
        }

        Ok(pageable)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }

    /// The requested orders followed by `id ASC` as a tie-breaker, unless `id`
    /// was already requested.
    pub fn effective_sort(&self) -> Vec<SortOrder> {
        let mut sort = self.sort.clone();
        if !sort.iter().any(|order| order.field == SortField::Id) {
            sort.push(SortOrder {
                field: SortField::Id,
                direction: Direction::Asc,
            });
        }
        sort
    }

    /// `ORDER BY` clause body built only from whitelisted columns.
    pub fn order_by_sql(&self) -> String {
        self.effective_sort()
            .into_iter()
            .map(|order| format!("{} {}", order.field.column(), order.direction.keyword()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn compare(&self, a: &Student, b: &Student) -> Ordering {
        for order in self.effective_sort() {
            let ordering = match order.direction {
                Direction::Asc => order.field.compare(a, b),
                Direction::Desc => order.field.compare(b, a),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Sorts `students` and returns only the requested page.
    pub fn apply(&self, mut students: Vec<Student>) -> Vec<Student> {
        students.sort_by(|a, b| self.compare(a, b));

        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit()).unwrap_or(usize::MAX);
        students.into_iter().skip(offset).take(limit).collect()
    }
}
