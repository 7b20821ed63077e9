use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;
use std::ptr::NonNull;

pub struct Node<T> {
    value: T,
    prev: Option<NonNull<Node<T>>>,
    next: Option<NonNull<Node<T>>>,
}

impl<T> Node<T> {
    pub fn prev_node(&self) -> Option<NonNull<Node<T>>> {
        self.prev
    }

    pub fn next_node(&self) -> Option<NonNull<Node<T>>> {
        self.next
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

/// Iteration direction of a [`ListIter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// head to tail
    Head,
    /// tail to head
    Tail,
}

/// Cursor handed out by `List::get_iterator`. It already points at the node
/// following the one last returned, so the caller may delete the returned
/// node with `delete_node`.
#[derive(Debug)]
pub struct ListIter<T> {
    next: Option<NonNull<Node<T>>>,
    direction: Direction,
}

/// Doubly linked list. Nodes are heap allocated and addressed by
/// `NonNull<Node<T>>` handles; a handle stays valid until its node is
/// deleted or the list is emptied or dropped.
pub struct List<T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    _boo: PhantomData<Box<Node<T>>>,
}

unsafe impl<T: Send> Send for List<T> {}
unsafe impl<T: Sync> Sync for List<T> {}

fn new_node<T>(value: T) -> NonNull<Node<T>> {
    let node = Box::new(Node {
        value,
        prev: None,
        next: None,
    });
    NonNull::from(Box::leak(node))
}

impl<T> Default for List<T> {
    fn default() -> Self {
        Self::create()
    }
}

impl<T> List<T> {
    pub fn create() -> List<T> {
        Self {
            head: None,
            tail: None,
            len: 0,
            _boo: PhantomData,
        }
    }

    pub fn length(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first_node(&self) -> Option<NonNull<Node<T>>> {
        self.head
    }

    pub fn last_node(&self) -> Option<NonNull<Node<T>>> {
        self.tail
    }

    pub fn first(&self) -> Option<&T> {
        unsafe { self.head.map(|node| &(*node.as_ptr()).value) }
    }

    pub fn last(&self) -> Option<&T> {
        unsafe { self.tail.map(|node| &(*node.as_ptr()).value) }
    }

    pub fn add_node_head(&mut self, value: T) -> NonNull<Node<T>> {
        let node = new_node(value);
        unsafe {
            match self.head {
                None => self.tail = Some(node),
                Some(head) => {
                    (*node.as_ptr()).next = Some(head);
                    (*head.as_ptr()).prev = Some(node);
                }
            }
        }
        self.head = Some(node);
        self.len += 1;
        node
    }

    pub fn add_node_tail(&mut self, value: T) -> NonNull<Node<T>> {
        let node = new_node(value);
        unsafe {
            match self.tail {
                None => self.head = Some(node),
                Some(tail) => {
                    (*node.as_ptr()).prev = Some(tail);
                    (*tail.as_ptr()).next = Some(node);
                }
            }
        }
        self.tail = Some(node);
        self.len += 1;
        node
    }

    /// Inserts `value` right after (`after == true`) or before `old_node`.
    ///
    /// # Safety
    ///
    /// `old_node` must be a live node of this list.
    pub unsafe fn insert_node(
        &mut self,
        old_node: NonNull<Node<T>>,
        value: T,
        after: bool,
    ) -> NonNull<Node<T>> {
        let node = new_node(value);
        let n = node.as_ptr();
        let old = old_node.as_ptr();
        if after {
            (*n).prev = Some(old_node);
            (*n).next = (*old).next;
            if self.tail == Some(old_node) {
                self.tail = Some(node);
            }
        } else {
            (*n).next = Some(old_node);
            (*n).prev = (*old).prev;
            if self.head == Some(old_node) {
                self.head = Some(node);
            }
        }
        if let Some(prev) = (*n).prev {
            (*prev.as_ptr()).next = Some(node);
        }
        if let Some(next) = (*n).next {
            (*next.as_ptr()).prev = Some(node);
        }
        self.len += 1;
        node
    }

    fn unlink_node(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            let n = node.as_ptr();
            match (*n).prev {
                Some(prev) => (*prev.as_ptr()).next = (*n).next,
                None => self.head = (*n).next,
            }
            match (*n).next {
                Some(next) => (*next.as_ptr()).prev = (*n).prev,
                None => self.tail = (*n).prev,
            }
            (*n).prev = None;
            (*n).next = None;
        }
        self.len -= 1;
    }

    /// Removes `node` from the list and returns its value.
    ///
    /// # Safety
    ///
    /// `node` must be a live node of this list. The handle is dangling
    /// afterwards.
    pub unsafe fn delete_node(&mut self, node: NonNull<Node<T>>) -> T {
        self.unlink_node(node);
        Box::from_raw(node.as_ptr()).value
    }

    /// Borrows the value of a node handle.
    ///
    /// # Safety
    ///
    /// `node` must be a live node of this list.
    pub unsafe fn node_value(&self, node: NonNull<Node<T>>) -> &T {
        &(*node.as_ptr()).value
    }

    /// Returns the node at `index`, 0 being the head. Negative indexes count
    /// from the tail, -1 being the last node.
    pub fn index(&self, index: i64) -> Option<NonNull<Node<T>>> {
        let (mut cur, mut steps, backward) = if index < 0 {
            (self.tail, -(index + 1), true)
        } else {
            (self.head, index, false)
        };
        unsafe {
            while let Some(node) = cur {
                if steps == 0 {
                    break;
                }
                cur = if backward {
                    (*node.as_ptr()).prev
                } else {
                    (*node.as_ptr()).next
                };
                steps -= 1;
            }
        }
        cur
    }

    /// First node, from the head, whose value satisfies `matches`.
    pub fn search_key_by<F>(&self, mut matches: F) -> Option<NonNull<Node<T>>>
    where
        F: FnMut(&T) -> bool,
    {
        let mut cur = self.head;
        unsafe {
            while let Some(node) = cur {
                if matches(&(*node.as_ptr()).value) {
                    return Some(node);
                }
                cur = (*node.as_ptr()).next;
            }
        }
        None
    }

    pub fn search_key(&self, key: &T) -> Option<NonNull<Node<T>>>
    where
        T: PartialEq,
    {
        self.search_key_by(|value| value == key)
    }

    /// Deletes every node equal to `key`, returning how many were removed.
    pub fn delete(&mut self, key: &T) -> usize
    where
        T: PartialEq,
    {
        let mut removed = 0;
        let mut cur = self.head;
        while let Some(node) = cur {
            unsafe {
                cur = (*node.as_ptr()).next;
                if (*node.as_ptr()).value == *key {
                    self.delete_node(node);
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Moves the tail node to the head.
    pub fn rotate_tail_to_head(&mut self) {
        if self.len <= 1 {
            return;
        }
        if let Some(tail) = self.tail {
            self.unlink_node(tail);
            self.link_head(tail);
        }
    }

    /// Moves the head node to the tail.
    pub fn rotate_head_to_tail(&mut self) {
        if self.len <= 1 {
            return;
        }
        if let Some(head) = self.head {
            self.unlink_node(head);
            self.link_tail(head);
        }
    }

    fn link_head(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            (*node.as_ptr()).next = self.head;
            match self.head {
                Some(head) => (*head.as_ptr()).prev = Some(node),
                None => self.tail = Some(node),
            }
        }
        self.head = Some(node);
        self.len += 1;
    }

    fn link_tail(&mut self, node: NonNull<Node<T>>) {
        unsafe {
            (*node.as_ptr()).prev = self.tail;
            match self.tail {
                Some(tail) => (*tail.as_ptr()).next = Some(node),
                None => self.head = Some(node),
            }
        }
        self.tail = Some(node);
        self.len += 1;
    }

    /// Appends every node of `other` to this list, leaving `other` empty.
    pub fn join(&mut self, other: &mut List<T>) {
        let (Some(other_head), Some(other_tail)) = (other.head, other.tail) else {
            return;
        };
        unsafe {
            (*other_head.as_ptr()).prev = self.tail;
            match self.tail {
                Some(tail) => (*tail.as_ptr()).next = Some(other_head),
                None => self.head = Some(other_head),
            }
        }
        self.tail = Some(other_tail);
        self.len += other.len;
        other.head = None;
        other.tail = None;
        other.len = 0;
    }

    /// Frees every node, keeping the list usable.
    pub fn empty(&mut self) {
        let mut cur = self.head;
        while let Some(node) = cur {
            unsafe {
                let boxed = Box::from_raw(node.as_ptr());
                cur = boxed.next;
            }
        }
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub fn get_iterator(&self, direction: Direction) -> ListIter<T> {
        let next = match direction {
            Direction::Head => self.head,
            Direction::Tail => self.tail,
        };
        ListIter { next, direction }
    }

    /// Restarts `it` from the head, iterating towards the tail.
    pub fn rewind(&self, it: &mut ListIter<T>) {
        it.next = self.head;
        it.direction = Direction::Head;
    }

    /// Restarts `it` from the tail, iterating towards the head.
    pub fn rewind_tail(&self, it: &mut ListIter<T>) {
        it.next = self.tail;
        it.direction = Direction::Tail;
    }

    /// Advances `it` and returns the handle of the current node.
    pub fn next(&self, it: &mut ListIter<T>) -> Option<NonNull<Node<T>>> {
        let current = it.next?;
        unsafe {
            it.next = match it.direction {
                Direction::Head => (*current.as_ptr()).next,
                Direction::Tail => (*current.as_ptr()).prev,
            };
        }
        Some(current)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            head: self.head,
            tail: self.tail,
            len: self.len,
            _boo: PhantomData,
        }
    }
}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        let mut copy = List::create();
        for value in self.iter() {
            copy.add_node_tail(value.clone());
        }
        copy
    }
}

impl<T: Debug> Debug for List<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.empty()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = List::create();
        for value in iter {
            list.add_node_tail(value);
        }
        list
    }
}

pub struct Iter<'a, T> {
    head: Option<NonNull<Node<T>>>,
    tail: Option<NonNull<Node<T>>>,
    len: usize,
    _boo: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    fn next(&mut self) -> Option<Self::Item> {
        if self.len > 0 {
            self.head.map(|node| unsafe {
                self.len -= 1;
                self.head = (*node.as_ptr()).next;
                &(*node.as_ptr()).value
            })
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len > 0 {
            self.tail.map(|node| unsafe {
                self.len -= 1;
                self.tail = (*node.as_ptr()).prev;
                &(*node.as_ptr()).value
            })
        } else {
            None
        }
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {
    fn len(&self) -> usize {
        self.len
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
