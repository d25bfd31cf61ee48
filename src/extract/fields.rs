use super::convert::{parse_date, parse_decimal, parse_flag};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// 提取字段的目标类型，同时决定使用哪个转换器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    Text,
    Decimal,
    Date,
    Flag,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Decimal(BigDecimal),
    Date(NaiveDate),
    Flag(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.write_str(v),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Flag(v) => write!(f, "{v}"),
        }
    }
}

/// 字段原始值相对标签的位置
#[derive(Debug, Clone, Copy)]
pub enum Locator {
    /// 标签的下一行
    After(&'static str),
    /// 标签的上一行
    Before(&'static str),
    /// 原始正则，第 1 个捕获组为值
    Pattern(&'static str),
    /// 标签所在行下方第 `offset` 行
    LinesBelow { label: &'static str, offset: usize },
}

/// 声明式提取表中的一行
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub locators: &'static [Locator],
    pub kind: ValueKind,
}

impl FieldSpec {
    pub const fn text(name: &'static str, locators: &'static [Locator]) -> Self {
        Self { name, locators, kind: ValueKind::Text }
    }

    pub const fn decimal(name: &'static str, locators: &'static [Locator]) -> Self {
        Self { name, locators, kind: ValueKind::Decimal }
    }

    pub const fn date(name: &'static str, locators: &'static [Locator]) -> Self {
        Self { name, locators, kind: ValueKind::Date }
    }

    pub const fn flag(name: &'static str, locators: &'static [Locator]) -> Self {
        Self { name, locators, kind: ValueKind::Flag }
    }
}

#[derive(Debug)]
enum Matcher {
    Capture(Regex),
    LinesBelow { label: &'static str, offset: usize },
}

impl Matcher {
    fn compile(locator: &Locator) -> Self {
        let pattern = match *locator {
            Locator::After(label) => format!("{}\n([^\n]+)", regex::escape(label)),
            Locator::Before(label) => format!("([^\n]+)\n{}", regex::escape(label)),
            Locator::Pattern(pattern) => pattern.to_string(),
            Locator::LinesBelow { label, offset } => return Self::LinesBelow { label, offset },
        };
        // 正则来自静态表，编译失败属于编程错误
        Self::Capture(Regex::new(&pattern).expect("field pattern must compile"))
    }

    fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        match self {
            Self::Capture(re) => re
                .captures(text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str()),
            Self::LinesBelow { label, offset } => {
                let position = text.find(label)?;
                let line = text[..position].matches('\n').count();
                text.lines().nth(line + offset)
            }
        }
    }
}

/// 定位器已编译为正则的字段定义
#[derive(Debug)]
pub struct CompiledField {
    pub name: &'static str,
    pub kind: ValueKind,
    matchers: Vec<Matcher>,
}

impl CompiledField {
    pub fn compile(spec: &FieldSpec) -> Self {
        Self {
            name: spec.name,
            kind: spec.kind,
            matchers: spec.locators.iter().map(Matcher::compile).collect(),
        }
    }

    /// 第一个匹配定位器的原始文本（已去除首尾空白）
    pub fn find_raw<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.matchers
            .iter()
            .find_map(|m| m.find(text))
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
    }

    pub fn extract(&self, text: &str) -> Field {
        let Some(raw) = self.find_raw(text) else {
            tracing::debug!("field {} not found", self.name);
            return Field::absent(self.name, self.kind);
        };

        let value = match self.kind {
            ValueKind::Text => Some(FieldValue::Text(raw.to_string())),
            ValueKind::Decimal => parse_decimal(raw).map(FieldValue::Decimal),
            ValueKind::Date => parse_date(raw).map(FieldValue::Date),
            ValueKind::Flag => parse_flag(raw).map(FieldValue::Flag),
        };

        if value.is_none() {
            match self.kind {
                ValueKind::Flag => tracing::debug!("field {}: unknown answer '{}'", self.name, raw),
                _ => tracing::warn!("field {}: invalid {:?} value '{}'", self.name, self.kind, raw),
            }
        }

        Field {
            name: self.name,
            kind: self.kind,
            value,
        }
    }
}

/// 提取出的字段；缺失值保留类型，以便写入带类型的 NULL
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub kind: ValueKind,
    pub value: Option<FieldValue>,
}

impl Field {
    pub fn absent(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind, value: None }
    }
}

/// 按列名索引的有序字段集合
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: IndexMap<&'static str, Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field) {
        self.fields.insert(field.name, field);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).and_then(|f| f.value.as_ref())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(FieldValue::Text(v)) => Some(v),
            _ => None,
        }
    }

    pub fn decimal(&self, name: &str) -> Option<&BigDecimal> {
        match self.get(name) {
            Some(FieldValue::Decimal(v)) => Some(v),
            _ => None,
        }
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        match self.get(name) {
            Some(FieldValue::Date(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(FieldValue::Flag(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 有值的字段数量
    pub fn present(&self) -> usize {
        self.fields.values().filter(|f| f.value.is_some()).count()
    }
}

/// 对 `text` 独立运行每个已编译字段
pub fn extract_fields(text: &str, fields: &[CompiledField]) -> FieldSet {
    let mut set = FieldSet::new();
    for field in fields {
        set.insert(field.extract(text));
    }
    set
}
