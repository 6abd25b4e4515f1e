// ── Entity query builder ──
//
// Expresses the handful of filters the hierarchy needs (type, parent,
// id set) in the store's `column=op.value` query grammar.

/// How to constrain `parent_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ParentFilter {
    #[default]
    Any,
    /// `parent_id IS NULL`: top-level customers.
    Root,
    /// Direct children of one entity.
    Eq(String),
    /// Direct children of any entity in the set.
    In(Vec<String>),
}

/// A filtered, ordered read of the `entities` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityQuery {
    pub entity_type: Option<String>,
    pub parent: ParentFilter,
    pub ids: Option<Vec<String>>,
    /// Sort by `entity_name` ascending (the default for every listing).
    pub order_by_name: bool,
    pub limit: Option<u32>,
}

impl Default for EntityQuery {
    fn default() -> Self {
        Self {
            entity_type: None,
            parent: ParentFilter::Any,
            ids: None,
            order_by_name: true,
            limit: None,
        }
    }
}

impl EntityQuery {
    /// Every row, ordered by name.
    pub fn all() -> Self {
        Self::default()
    }

    /// Top-level rows (`parent_id IS NULL`).
    pub fn roots() -> Self {
        Self {
            parent: ParentFilter::Root,
            ..Self::default()
        }
    }

    pub fn children_of(parent_id: impl Into<String>) -> Self {
        Self {
            parent: ParentFilter::Eq(parent_id.into()),
            ..Self::default()
        }
    }

    pub fn children_of_any(parent_ids: Vec<String>) -> Self {
        Self {
            parent: ParentFilter::In(parent_ids),
            ..Self::default()
        }
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            ids: Some(vec![id.into()]),
            order_by_name: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn of_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as query parameters in the store's filter grammar.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("select", "*".to_owned())];

        if let Some(ref t) = self.entity_type {
            params.push(("entity_type", format!("eq.{t}")));
        }

        match &self.parent {
            ParentFilter::Any => {}
            ParentFilter::Root => params.push(("parent_id", "is.null".to_owned())),
            ParentFilter::Eq(id) => params.push(("parent_id", format!("eq.{id}"))),
            ParentFilter::In(ids) => params.push(("parent_id", in_list(ids))),
        }

        match self.ids.as_deref() {
            Some([single]) => params.push(("id", format!("eq.{single}"))),
            Some(ids) => params.push(("id", in_list(ids))),
            None => {}
        }

        if self.order_by_name {
            params.push(("order", "entity_name.asc".to_owned()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }

        params
    }
}

/// `in.("a","b")`: values are quoted so ids containing commas or
/// parentheses survive the list syntax.
pub(crate) fn in_list(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn all_orders_by_name() {
        let params = EntityQuery::all().to_params();
        assert_eq!(param(&params, "select"), Some("*"));
        assert_eq!(param(&params, "order"), Some("entity_name.asc"));
        assert_eq!(param(&params, "parent_id"), None);
    }

    #[test]
    fn roots_filter_null_parent() {
        let params = EntityQuery::roots().of_type("customer").to_params();
        assert_eq!(param(&params, "parent_id"), Some("is.null"));
        assert_eq!(param(&params, "entity_type"), Some("eq.customer"));
    }

    #[test]
    fn children_of_any_uses_quoted_in_list() {
        let params = EntityQuery::children_of_any(vec!["c1".into(), "c2".into()]).to_params();
        assert_eq!(param(&params, "parent_id"), Some(r#"in.("c1","c2")"#));
    }

    #[test]
    fn by_id_is_unordered_point_lookup() {
        let params = EntityQuery::by_id("z1").to_params();
        assert_eq!(param(&params, "id"), Some("eq.z1"));
        assert_eq!(param(&params, "order"), None);
    }

    #[test]
    fn limit_is_rendered() {
        let params = EntityQuery::children_of("b1").with_limit(10).to_params();
        assert_eq!(param(&params, "parent_id"), Some("eq.b1"));
        assert_eq!(param(&params, "limit"), Some("10"));
    }
}
