//! An indexed max-heap over the keys `[0, ..., n - 1]`.
//!
//! Keys can be taken out of the heap and put back later while keeping their value, and values can
//! be bumped or rescaled in place. The activity scheduling policy uses it to always hand out the
//! pending propagator with the highest weight.
use std::ops::AddAssign;
use std::ops::DivAssign;

use super::KeyedVec;
use super::StorageKey;
use crate::fixpoint_assert_moderate;

#[derive(Debug, Clone)]
pub struct KeyValueHeap<Key, Value> {
    /// The values in heap order; positions `[0, end_position)` form the heap, the remaining
    /// positions hold the values of keys which are currently not in the heap.
    values: Vec<Value>,
    map_key_to_position: KeyedVec<Key, usize>,
    map_position_to_key: Vec<Key>,
    end_position: usize,
}

impl<Key: StorageKey, Value> Default for KeyValueHeap<Key, Value> {
    fn default() -> Self {
        Self {
            values: Vec::default(),
            map_key_to_position: KeyedVec::default(),
            map_position_to_key: Vec::default(),
            end_position: 0,
        }
    }
}

impl<Key, Value> KeyValueHeap<Key, Value>
where
    Key: StorageKey + Copy,
    Value: AddAssign<Value> + DivAssign<Value> + PartialOrd + Default + Copy,
{
    /// The key with the largest value, without removing it.
    pub fn peek_max(&self) -> Option<Key> {
        (self.end_position > 0).then(|| self.map_position_to_key[0])
    }

    /// Removes the key with the largest value from the heap; its value is retained.
    pub fn pop_max(&mut self) -> Option<Key> {
        let best_key = self.peek_max()?;
        self.delete_key(best_key);
        Some(best_key)
    }

    pub fn get_value(&self, key: Key) -> Value {
        self.values[self.map_key_to_position[key]]
    }

    /// Adds `increment` to the value of `key`, whether or not the key is in the heap.
    pub fn increment(&mut self, key: Key, increment: Value) {
        let position = self.map_key_to_position[key];
        self.values[position] += increment;
        if self.is_key_present(key) {
            self.sift_up(position);
        }
    }

    /// Puts a previously deleted key back into the heap with its retained value.
    pub fn restore_key(&mut self, key: Key) {
        if !self.is_key_present(key) {
            let position = self.map_key_to_position[key];
            fixpoint_assert_moderate!(position >= self.end_position);
            self.swap_positions(position, self.end_position);
            self.end_position += 1;
            self.sift_up(self.end_position - 1);
        }
    }

    /// Takes `key` out of the heap. Does nothing if it is not present.
    pub fn delete_key(&mut self, key: Key) {
        if self.is_key_present(key) {
            let position = self.map_key_to_position[key];
            self.swap_positions(position, self.end_position - 1);
            self.end_position -= 1;
            if position >= self.end_position {
                return;
            }

            // The last value was moved into the gap; it may be larger than its new parent.
            if position > 0 && self.values[(position - 1) / 2] < self.values[position] {
                self.sift_up(position);
            } else {
                self.sift_down(position);
            }
        }
    }

    /// The number of keys known to the heap, including the deleted ones.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.end_position == 0
    }

    pub fn is_key_present(&self, key: Key) -> bool {
        key.index() < self.map_key_to_position.len()
            && self.map_key_to_position[key] < self.end_position
    }

    /// Registers the next key with `value`. Keys have to be grown in order `0, 1, ...`; the new
    /// key starts out deleted.
    pub fn grow(&mut self, key: Key, value: Value) {
        fixpoint_assert_moderate!(key.index() == self.values.len());
        let position = self.values.len();
        self.values.push(value);
        let _ = self.map_key_to_position.push(position);
        self.map_position_to_key.push(key);
    }

    /// Divides every value (including those of deleted keys) by `divisor`.
    pub fn divide_values(&mut self, divisor: Value) {
        for value in self.values.iter_mut() {
            *value /= divisor;
        }
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        let key_a = self.map_position_to_key[a];
        let key_b = self.map_position_to_key[b];

        self.values.swap(a, b);
        self.map_position_to_key.swap(a, b);
        self.map_key_to_position.swap(key_a.index(), key_b.index());
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.values[parent] >= self.values[position] {
                break;
            }
            self.swap_positions(parent, position);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        loop {
            let left = 2 * position + 1;
            let right = left + 1;
            if left >= self.end_position {
                break;
            }

            let mut largest_child = left;
            if right < self.end_position && self.values[right] > self.values[left] {
                largest_child = right;
            }

            if self.values[position] >= self.values[largest_child] {
                break;
            }
            self.swap_positions(position, largest_child);
            position = largest_child;
        }
    }
}
