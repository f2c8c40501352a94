//! 元数据定义
//!
//! 提供类型名称、绑定键以及声明来源等基础元数据

use crate::errors::TypeNameError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 类型名称
///
/// 以文本形式描述一个名义类型，例如 `test.A` 或 `java.util.Set<java.lang.String>`。
/// 序列化时使用其文本形式。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeName {
    /// 完整路径（不含类型参数）
    pub path: String,
    /// 类型参数
    pub arguments: Vec<TypeName>,
}

impl TypeName {
    /// 创建新的类型名称（不带类型参数）
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            arguments: Vec::new(),
        }
    }

    /// 创建带类型参数的类型名称
    pub fn generic(path: impl Into<String>, arguments: Vec<TypeName>) -> Self {
        Self {
            path: path.into(),
            arguments,
        }
    }

    /// 解析文本形式的类型名称
    pub fn parse(input: &str) -> Result<Self, TypeNameError> {
        let mut parser = TypeNameParser {
            input,
            position: 0,
        };
        let parsed = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.position != input.len() {
            return Err(TypeNameError::new(input, "存在多余字符"));
        }
        Ok(parsed)
    }

    /// 获取简短的类型名称（不包含命名空间）
    pub fn simple_name(&self) -> &str {
        self.path
            .rsplit(|c: char| c == '.' || c == ':' || c == '$')
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.path)
    }

    /// 获取命名空间（不含简短名称）
    pub fn namespace(&self) -> Option<&str> {
        let is_separator = |c: char| c == '.' || c == ':' || c == '$';
        let path = self.path.trim_end_matches(is_separator);
        let end = path.rfind(is_separator)?;
        Some(path[..end].trim_end_matches(is_separator)).filter(|ns| !ns.is_empty())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if !self.arguments.is_empty() {
            write!(f, "<")?;
            for (index, argument) in self.arguments.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", argument)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeName {
    type Err = TypeNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TypeName {
    type Error = TypeNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TypeName> for String {
    fn from(value: TypeName) -> Self {
        value.to_string()
    }
}

/// 类型名称的递归下降解析器
struct TypeNameParser<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> TypeNameParser<'a> {
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.position += c.len_utf8();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn parse_type(&mut self) -> Result<TypeName, TypeNameError> {
        self.skip_whitespace();
        let start = self.position;
        while let Some(c) = self.peek() {
            if c == '<' || c == '>' || c == ',' || c.is_whitespace() {
                break;
            }
            self.position += c.len_utf8();
        }
        let path = &self.input[start..self.position];
        if path.is_empty() {
            return Err(TypeNameError::new(self.input, "缺少类型路径"));
        }

        let mut arguments = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some('<') {
            self.position += 1;
            loop {
                arguments.push(self.parse_type()?);
                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.position += 1,
                    Some('>') => {
                        self.position += 1;
                        break;
                    }
                    _ => return Err(TypeNameError::new(self.input, "类型参数未闭合")),
                }
            }
        }

        Ok(TypeName::generic(path, arguments))
    }
}

/// 绑定键
///
/// 由名义类型和可选限定符组成，两个键当且仅当类型与限定符完全一致时相等
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key {
    /// 类型名称
    #[serde(rename = "type")]
    pub type_name: TypeName,
    /// 限定符
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

impl Key {
    /// 从类型名称创建键
    pub fn new(type_name: TypeName) -> Self {
        Self {
            type_name,
            qualifier: None,
        }
    }

    /// 从类型路径创建键，路径中可以包含类型参数
    ///
    /// 无法解析的路径按原样作为不带类型参数的路径使用。
    pub fn of(path: &str) -> Self {
        Self::new(TypeName::parse(path).unwrap_or_else(|_| TypeName::new(path)))
    }

    /// 创建带限定符的键
    pub fn qualified(path: &str, qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            ..Self::of(path)
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "@{} {}", qualifier, self.type_name),
            None => write!(f, "{}", self.type_name),
        }
    }
}

/// 源码位置
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 文件路径
    pub file: String,
    /// 行号
    pub line: u32,
    /// 列号
    #[serde(default)]
    pub column: u32,
}

impl SourceLocation {
    /// 创建新的源码位置
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// 声明来源
///
/// 记录声明所属的模块或类型、成员名称以及源码位置，用于诊断
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    /// 所属模块或类型
    pub owner: TypeName,
    /// 成员名称（提供方法名、访问器名等）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<String>,
    /// 源码位置
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl Origin {
    /// 创建新的声明来源
    pub fn new(owner: TypeName) -> Self {
        Self {
            owner,
            member: None,
            location: None,
        }
    }

    /// 设置成员名称
    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }

    /// 设置源码位置
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.owner)?;
        if let Some(member) = &self.member {
            write!(f, ".{}", member)?;
        }
        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }
        Ok(())
    }
}
