/// Bucketed index mapping grid cells to the actor ids standing in them.
///
/// One flat `order` array holds every actor id sorted by row-major cell;
/// `start`/`len` slice it per cell. Lookups are a slice borrow, a whole
/// row-window is one contiguous slice, and moving an actor costs time
/// proportional to the bucket distance between its old and new cell rather
/// than a rebuild.
pub struct ActorIndex {
    pub rows: i32,
    pub cols: i32,
    /// Actor ids, bucket by bucket in cell order
    order: Vec<usize>,
    /// First slot of each cell's bucket in `order`
    start: Vec<usize>,
    /// Actors per cell
    len: Vec<usize>,
}

impl ActorIndex {
    /// Empty index over a rows x cols grid
    pub fn new(rows: i32, cols: i32) -> Self {
        let count = (rows * cols).max(0) as usize;
        ActorIndex {
            rows,
            cols,
            order: Vec::new(),
            start: vec![0; count],
            len: vec![0; count],
        }
    }

    /// Bucket id for a world position. Positions are clamped onto the map so
    /// a stray actor can never corrupt the bookkeeping. A zero-size index
    /// answers 0 and every mutator below no-ops on one.
    pub fn cell_of(&self, pos: (f32, f32)) -> i32 {
        if self.rows <= 0 || self.cols <= 0 {
            return 0;
        }
        let x = (pos.0.floor() as i32).clamp(0, self.cols - 1);
        let y = (pos.1.floor() as i32).clamp(0, self.rows - 1);
        x + y * self.cols
    }

    /// Rebuild from scratch; `positions[id]` is actor id's position. The
    /// sort is stable, so ids within a bucket keep ascending order here.
    pub fn build(&mut self, positions: &[(f32, f32)]) {
        let count = (self.rows * self.cols).max(0) as usize;
        if count == 0 {
            self.order.clear();
            return;
        }
        let cells: Vec<i32> = positions.iter().map(|&p| self.cell_of(p)).collect();
        self.order = (0..positions.len()).collect();
        self.order.sort_by_key(|&id| cells[id]);
        self.len = vec![0; count];
        for &cell in &cells {
            self.len[cell as usize] += 1;
        }
        self.start = vec![0; count];
        let mut acc = 0;
        for c in 0..count {
            self.start[c] = acc;
            acc += self.len[c];
        }
    }

    /// Actors standing in cell (x, y); empty for off-map cells
    pub fn query(&self, x: i32, y: i32) -> &[usize] {
        if x < 0 || x >= self.cols || y < 0 || y >= self.rows {
            return &[];
        }
        let c = (x + y * self.cols) as usize;
        &self.order[self.start[c]..self.start[c] + self.len[c]]
    }

    /// Actors in the row-y window of cells x - half_width ..= x + half_width,
    /// clamped to the map. Row-major bucket layout makes the whole window one
    /// contiguous slice.
    pub fn query_row(&self, x: i32, y: i32, half_width: i32) -> &[usize] {
        if y < 0 || y >= self.rows {
            return &[];
        }
        let lo = (x - half_width).max(0);
        let hi = (x + half_width).min(self.cols - 1);
        if lo > hi {
            return &[];
        }
        let a = (lo + y * self.cols) as usize;
        let b = (hi + y * self.cols) as usize;
        &self.order[self.start[a]..self.start[b] + self.len[b]]
    }

    /// Incrementally rebucket one actor. The caller owns the old/new pairing:
    /// `old_pos` must be the position this id was last indexed under.
    ///
    /// The id is swapped out through the boundary of its old bucket, every
    /// bucket strictly between old and new cell slides one slot toward the
    /// vacancy, and the id drops into the boundary slot of the new bucket.
    /// Within-bucket order is not preserved — nothing reads it.
    pub fn move_actor(&mut self, id: usize, old_pos: (f32, f32), new_pos: (f32, f32)) {
        if self.start.is_empty() {
            return;
        }
        let old_cell = self.cell_of(old_pos) as usize;
        let new_cell = self.cell_of(new_pos) as usize;
        if old_cell == new_cell {
            return;
        }

        let bucket = self.start[old_cell]..self.start[old_cell] + self.len[old_cell];
        let pos = match self.order[bucket.clone()].iter().position(|&a| a == id) {
            Some(offset) => bucket.start + offset,
            None => return,
        };

        if new_cell > old_cell {
            // pull the id out through the back of its old bucket
            let back = self.start[old_cell] + self.len[old_cell] - 1;
            self.order.swap(pos, back);
            self.len[old_cell] -= 1;
            let mut hole = back;
            for c in old_cell + 1..new_cell {
                let tail = self.start[c] + self.len[c] - 1;
                self.order[hole] = self.order[tail];
                hole = tail;
                self.start[c] -= 1;
            }
            // and in through the front of the new one
            self.order[hole] = id;
            self.start[new_cell] -= 1;
            self.len[new_cell] += 1;
        } else {
            let front = self.start[old_cell];
            self.order.swap(pos, front);
            self.start[old_cell] += 1;
            self.len[old_cell] -= 1;
            let mut hole = front;
            for c in (new_cell + 1..old_cell).rev() {
                let head = self.start[c];
                self.order[hole] = self.order[head];
                hole = head;
                self.start[c] += 1;
            }
            self.order[hole] = id;
            self.len[new_cell] += 1;
        }
    }

    /// Add one actor id under `pos`. The id must not already be indexed.
    pub fn insert_actor(&mut self, id: usize, pos: (f32, f32)) {
        if self.start.is_empty() {
            return;
        }
        let cell = self.cell_of(pos) as usize;
        self.order.insert(self.start[cell] + self.len[cell], id);
        self.len[cell] += 1;
        for c in cell + 1..self.start.len() {
            self.start[c] += 1;
        }
    }

    /// Drop one actor id from the index, so a body that left play (a dead
    /// agent, a despawn) stops turning up in queries. `pos` must be the
    /// position the id was last indexed under; an id that is not there is
    /// a no-op.
    pub fn remove_actor(&mut self, id: usize, pos: (f32, f32)) {
        if self.start.is_empty() {
            return;
        }
        let cell = self.cell_of(pos) as usize;
        let bucket = self.start[cell]..self.start[cell] + self.len[cell];
        let slot = match self.order[bucket.clone()].iter().position(|&a| a == id) {
            Some(offset) => bucket.start + offset,
            None => return,
        };
        self.order.remove(slot);
        self.len[cell] -= 1;
        for c in cell + 1..self.start.len() {
            self.start[c] -= 1;
        }
    }
}
