use callbox::space::*;
use callbox::{callable, Callable};

fn main() {
    divan::main();
}

#[divan::bench]
fn callable_small_state() -> u64 {
    let state = divan::black_box(1u64);
    let callable: Callable<dyn Fn(u64) -> u64, S1> = callable!(move |x: u64| x + state);
    callable(divan::black_box(2))
}

#[divan::bench]
fn callable_large_state() -> u64 {
    let state = divan::black_box([1u64; 32]);
    let callable: Callable<dyn Fn(u64) -> u64, S32> = callable!(move |x: u64| x + state[31]);
    callable(divan::black_box(2))
}

#[divan::bench]
fn callable_function_pointer() -> u64 {
    fn add_one(x: u64) -> u64 {
        x + 1
    }
    let callable: Callable<dyn Fn(u64) -> u64, S1> = callable!(fn: add_one as fn(u64) -> u64);
    callable(divan::black_box(2))
}

#[divan::bench]
fn callable_clone() -> Callable<dyn Fn(u64) -> u64, S4> {
    let state = divan::black_box([1u64; 4]);
    let callable: Callable<dyn Fn(u64) -> u64, S4> = callable!(move |x: u64| x + state[3]);
    divan::black_box(&callable).clone()
}

#[divan::bench]
fn box_small_state() -> u64 {
    let state = divan::black_box(1u64);
    let boxed: Box<dyn Fn(u64) -> u64> = Box::new(move |x: u64| x + state);
    boxed(divan::black_box(2))
}

#[divan::bench]
fn box_large_state() -> u64 {
    let state = divan::black_box([1u64; 32]);
    let boxed: Box<dyn Fn(u64) -> u64> = Box::new(move |x: u64| x + state[31]);
    boxed(divan::black_box(2))
}
