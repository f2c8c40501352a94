//! 运行时实例

use infrastructure_common::TypeName;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// 类型擦除的实例
pub type Instance = Arc<dyn Any + Send + Sync>;

/// 两个实例是否为同一对象
pub fn same_instance(left: &Instance, right: &Instance) -> bool {
    Arc::as_ptr(left).cast::<()>() == Arc::as_ptr(right).cast::<()>()
}

/// 两个实例是否相等
///
/// 同一对象总是相等；字符串、整数、字符和布尔值按值比较，其余类型按对象身份比较。
pub fn value_eq(left: &Instance, right: &Instance) -> bool {
    if same_instance(left, right) {
        return true;
    }
    macro_rules! compare {
        ($($ty:ty),*) => {
            $(
                if let (Some(l), Some(r)) = (left.downcast_ref::<$ty>(), right.downcast_ref::<$ty>()) {
                    return l == r;
                }
            )*
        };
    }
    compare!(String, &'static str, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
    false
}

/// 向下转换为具体类型
pub fn downcast<T: Any + Send + Sync>(instance: &Instance) -> Option<Arc<T>> {
    Arc::clone(instance).downcast::<T>().ok()
}

/// 组件自身的句柄，自注入时作为组件类型的实例
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHandle {
    /// 组件实例 ID
    pub id: Uuid,
    /// 组件类型
    pub component: TypeName,
}

/// 集合绑定的实例，元素按贡献顺序排列并去重
#[derive(Debug, Clone, Default)]
pub struct SetInstance {
    elements: Vec<Instance>,
}

impl SetInstance {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 按 [`value_eq`] 加入元素，已有相等元素时忽略
    pub fn insert(&mut self, element: Instance) -> bool {
        self.insert_by(element, value_eq)
    }

    /// 按给定的相等关系加入元素
    pub fn insert_by(
        &mut self,
        element: Instance,
        eq: impl Fn(&Instance, &Instance) -> bool,
    ) -> bool {
        if self.elements.iter().any(|e| eq(e, &element)) {
            return false;
        }
        self.elements.push(element);
        true
    }

    /// 加入多个元素
    pub fn extend(&mut self, elements: impl IntoIterator<Item = Instance>) {
        for element in elements {
            self.insert(element);
        }
    }

    /// 是否包含相等的元素
    pub fn contains(&self, element: &Instance) -> bool {
        self.elements.iter().any(|e| value_eq(e, element))
    }

    /// 元素数量
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 遍历元素
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.elements.iter()
    }

    /// 取出指定类型的元素
    pub fn values<T: Any + Send + Sync>(&self) -> Vec<Arc<T>> {
        self.elements.iter().filter_map(downcast::<T>).collect()
    }
}
