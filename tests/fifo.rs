use cash::designs::fifo::{self, Fifo};
use cash_ir::Context;
use cash_sim::Simulator;

struct Harness<'a> {
    sim: Simulator<'a>,
    f: Fifo,
}

impl Harness<'_> {
    /// Drive the inputs, then run one pass.
    fn step(&mut self, push: u64, pop: u64, din: u64) {
        self.sim.set_u64(self.f.push, push).unwrap();
        self.sim.set_u64(self.f.pop, pop).unwrap();
        self.sim.set_u64(self.f.din, din).unwrap();
        self.sim.tick().unwrap();
    }

    /// Read the head word, then acknowledge it with a pop.
    fn pop(&mut self) -> u64 {
        let head = self.get(self.f.dout);
        self.step(0, 1, 0);
        head
    }

    fn get(&self, id: cash_ir::NodeId) -> u64 {
        self.sim.get_u64(id).unwrap()
    }

    fn flags(&self) -> (u64, u64) {
        (self.get(self.f.empty), self.get(self.f.full))
    }
}

fn build() -> (Context, Fifo) {
    let mut ctx = Context::new("fifo");
    let f = fifo::build(&mut ctx, 8).unwrap();
    (ctx, f)
}

#[test]
fn fills_then_drains_in_order() {
    let (ctx, f) = build();
    let mut h = Harness {
        sim: Simulator::new(&ctx).unwrap(),
        f,
    };

    // Power-on pass settles the pointers without an edge.
    h.step(0, 0, 0);
    assert_eq!(h.flags(), (1, 0));

    h.step(1, 0, 1);
    assert_eq!(h.flags(), (0, 0), "one write");
    assert_eq!(h.get(f.dout), 1);
    h.step(1, 0, 2);
    assert_eq!(h.flags(), (0, 1), "two writes");
    assert_eq!(h.get(f.wptr), 2);
    assert_eq!(h.get(f.rptr), 0);
    let distance = (h.get(f.wptr) + 4 - h.get(f.rptr)) % 4;
    assert_eq!(distance, u64::from(fifo::DEPTH));

    // A third push is refused once full.
    h.step(1, 0, 3);
    assert_eq!(h.flags(), (0, 1));
    assert_eq!(h.get(f.wptr), 2);

    assert_eq!(h.pop(), 1, "first read");
    assert_eq!(h.flags(), (0, 0));
    assert_eq!(h.pop(), 2, "second read");
    assert_eq!(h.flags(), (1, 0));
    assert_eq!(h.get(f.rptr), 2);

    let words = h.sim.memory(f.mem).unwrap();
    assert_eq!(words.iter().map(|w| w.to_u64().unwrap()).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn pop_on_empty_is_ignored() {
    let (ctx, f) = build();
    let mut h = Harness {
        sim: Simulator::new(&ctx).unwrap(),
        f,
    };
    for _ in 0..4 {
        h.step(0, 1, 0);
        assert_eq!(h.flags(), (1, 0));
        assert_eq!(h.get(f.rptr), 0);
    }
}

#[test]
fn pointers_wrap_around() {
    let (ctx, f) = build();
    let mut h = Harness {
        sim: Simulator::new(&ctx).unwrap(),
        f,
    };
    h.step(0, 0, 0);
    // Push and pop alternately, far past the pointer range.
    for i in 0..10u64 {
        h.step(1, 0, 0x10 + i);
        assert_eq!(h.flags(), (0, 0), "word {i} stored");
        assert_eq!(h.pop(), 0x10 + i, "word {i}");
        assert_eq!(h.flags(), (1, 0), "word {i} drained");
    }
    assert_eq!(h.get(f.wptr), 10 % 4);
    assert_eq!(h.get(f.rptr), 10 % 4);
}
