use std::ptr;

#[allow(dead_code)]
struct Sample(usize);

trait Probe {
    fn call_me(&self) -> usize;
}

impl Probe for Sample {
    fn call_me(&self) -> usize {
        self.0
    }
}

fn layout_broken(what: &str) {
    panic!(
        concat!(
            "Assumptions on layout are broken, this crate relies on ",
            "`unsafe code guidelines` layout specification, ",
            "now layout of {:?} is broken, report about it on github"
        ),
        what
    );
}

/// `callbox` re-points the metadata of a trait object pointer by overwriting
/// its first word. Check that the first word really is the data address, and
/// that overwriting it keeps the vtable usable.
fn test_dyn_layout() {
    #[repr(C)]
    struct DynObj {
        data_ptr: *const u8,
        vtable: *const u8,
    }

    let first = Sample(100);
    let second = Sample(200);

    let mut trait_obj: *const dyn Probe = &first;
    let dyn_obj_repr: DynObj = unsafe { ptr::read(ptr::addr_of!(trait_obj).cast::<DynObj>()) };
    if dyn_obj_repr.data_ptr != ptr::addr_of!(first).cast::<u8>() {
        layout_broken("trait objects");
    }

    unsafe {
        ptr::addr_of_mut!(trait_obj)
            .cast::<*const u8>()
            .write(ptr::addr_of!(second).cast::<u8>());
        if (*trait_obj).call_me() != 200 {
            layout_broken("trait objects");
        }
    }
}

fn main() {
    // NOTE: this runs on the host, whose layout may differ from the target's,
    // and new pointer kinds are not covered.
    test_dyn_layout();
}
