/// Returns the new whole-kilometer mark when `total_km` has passed `last_mark`.
///
/// Crossing several kilometers in one update yields a single jump to the
/// highest one, not one mark per kilometer.
pub fn check_milestone(total_km: f64, last_mark: u32) -> Option<u32> {
    if !total_km.is_finite() || total_km < 0. {
        return None;
    }

    let whole = total_km.floor() as u32;
    (whole > last_mark).then_some(whole)
}

#[test]
fn milestones() {
    assert_eq!(check_milestone(0.999, 0), None);
    assert_eq!(check_milestone(1.0, 0), Some(1));
    assert_eq!(check_milestone(3.5, 1), Some(3));
    assert_eq!(check_milestone(2.0, 0), Some(2));
    assert_eq!(check_milestone(2.3, 2), None);
    assert_eq!(check_milestone(0., 0), None);
    assert_eq!(check_milestone(f64::NAN, 0), None);
}
