// Small generic building blocks that the select IR is assembled from.
use serde::{Deserialize, Serialize};

/// A vector with at least one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NonEmpty<T> {
    pub head: T,
    pub tail: Vec<T>,
}

impl<T> NonEmpty<T> {
    pub fn new(head: T) -> Self {
        NonEmpty {
            head,
            tail: Vec::new(),
        }
    }

    pub fn from_vec(mut vec: Vec<T>) -> Option<Self> {
        if vec.is_empty() {
            return None;
        }
        let tail = vec.split_off(1);
        let head = vec.pop()?;
        Some(NonEmpty { head, tail })
    }

    pub fn len(&self) -> usize {
        self.tail.len() + 1
    }

    pub fn first(&self) -> &T {
        &self.head
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::once(&self.head).chain(self.tail.iter())
    }

    pub fn push(&mut self, item: T) {
        self.tail.push(item)
    }

    pub fn into_vec(self) -> Vec<T> {
        let mut vec = Vec::with_capacity(self.tail.len() + 1);
        vec.push(self.head);
        vec.extend(self.tail);
        vec
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> NonEmpty<U> {
        NonEmpty {
            head: f(self.head),
            tail: self.tail.into_iter().map(f).collect(),
        }
    }

    pub fn try_map<U, E, F: FnMut(T) -> Result<U, E>>(self, mut f: F) -> Result<NonEmpty<U>, E> {
        Ok(NonEmpty {
            head: f(self.head)?,
            tail: self.tail.into_iter().map(f).collect::<Result<_, _>>()?,
        })
    }
}

impl<T> IntoIterator for NonEmpty<T> {
    type Item = T;
    type IntoIter = std::iter::Chain<std::iter::Once<T>, std::vec::IntoIter<T>>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(self.head).chain(self.tail)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Default, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum NullsOrder {
    First,
    Last,
}

/// One entry of an `ORDER BY` list. Generic over what is being ordered by.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderByItem<T> {
    pub element: T,
    pub direction: Option<OrderDirection>,
    pub nulls: Option<NullsOrder>,
}

impl<T> OrderByItem<T> {
    pub fn asc(element: T) -> Self {
        OrderByItem {
            element,
            direction: Some(OrderDirection::Asc),
            nulls: None,
        }
    }

    pub fn desc(element: T) -> Self {
        OrderByItem {
            element,
            direction: Some(OrderDirection::Desc),
            nulls: None,
        }
    }

    /// Direction with the default (ascending) filled in.
    pub fn effective_direction(&self) -> OrderDirection {
        self.direction.unwrap_or_default()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(NonEmpty::<u8>::from_vec(vec![]), None);

        let ne = NonEmpty::from_vec(vec![1, 2, 3]).unwrap();
        assert_eq!(ne.head, 1);
        assert_eq!(ne.tail, vec![2, 3]);
        assert_eq!(ne.len(), 3);
        assert_eq!(ne.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(ne.clone().map(|x| x * 10).into_vec(), vec![10, 20, 30]);

        let res: Result<NonEmpty<u8>, &str> = ne.try_map(|x| if x < 3 { Ok(x) } else { Err("3") });
        assert_eq!(res, Err("3"));
    }
}
