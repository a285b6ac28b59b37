//! Property-based tests for the matrix layer using the `proptest` crate.

use proptest::prelude::*;

use solid_linalg::Matrix;

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// A well-conditioned 3x3 matrix: a random matrix plus a dominant diagonal.
fn arb_invertible_3x3() -> impl Strategy<Value = Matrix> {
    prop::collection::vec(-1.0f64..1.0, 9).prop_map(|mut values| {
        for i in 0..3 {
            values[i * 3 + i] += if values[i * 3 + i] >= 0.0 { 4.0 } else { -4.0 };
        }
        Matrix::from_row_slice(3, 3, &values).unwrap()
    })
}

fn arb_matrix(rows: usize, cols: usize) -> impl Strategy<Value = Matrix> {
    prop::collection::vec(-100.0f64..100.0, rows * cols)
        .prop_map(move |values| Matrix::from_row_slice(rows, cols, &values).unwrap())
}

fn arb_angle() -> impl Strategy<Value = f64> {
    -std::f64::consts::PI..std::f64::consts::PI
}

// ---------------------------------------------------------------------------
// 1. A * A^-1 == I
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn inverse_is_two_sided(a in arb_invertible_3x3()) {
        let inv = a.inverse().unwrap();
        prop_assert!(a.mul(&inv).unwrap().is_identity(), "A * A^-1 != I for\n{}", a);
        prop_assert!(inv.mul(&a).unwrap().is_identity(), "A^-1 * A != I for\n{}", a);
    }
}

// ---------------------------------------------------------------------------
// 2. P * A == L * U
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn lu_reconstructs_permuted_input(a in arb_invertible_3x3()) {
        let lu = a.decompose().unwrap();
        let lhs = lu.permutation_matrix().mul(&a).unwrap();
        let rhs = lu.extract_lower().mul(&lu.extract_upper()).unwrap();
        prop_assert_eq!(lhs, rhs);
    }
}

// ---------------------------------------------------------------------------
// 3. det(A * B) == det(A) * det(B)
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn determinant_is_multiplicative(a in arb_invertible_3x3(), b in arb_invertible_3x3()) {
        let ab = a.mul(&b).unwrap();
        let lhs = ab.determinant().unwrap();
        let rhs = a.determinant().unwrap() * b.determinant().unwrap();
        prop_assert!((lhs - rhs).abs() < 1e-9 * rhs.abs().max(1.0),
            "det(AB)={} != det(A)det(B)={}", lhs, rhs);
    }
}

// ---------------------------------------------------------------------------
// 4. Transpose of a product reverses the factors
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn transpose_reverses_product(a in arb_matrix(2, 3), b in arb_matrix(3, 4)) {
        let lhs = a.mul(&b).unwrap().transpose();
        let rhs = b.transpose().mul(&a.transpose()).unwrap();
        prop_assert_eq!(lhs, rhs);
    }
}

// ---------------------------------------------------------------------------
// 5. Rotation matrices are orthonormal with unit determinant
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn rodrigues_is_a_rotation(
        ax in -1.0f64..1.0, ay in -1.0f64..1.0, az in -1.0f64..1.0,
        angle in arb_angle(),
    ) {
        prop_assume!((ax * ax + ay * ay + az * az).sqrt() > 1e-3);
        let r = Matrix::rotation_about_axis([ax, ay, az], angle).unwrap();
        prop_assert!(r.transpose().mul(&r).unwrap().is_identity());
        prop_assert!((r.determinant().unwrap() - 1.0).abs() < 1e-9);
        prop_assert!(r.quaternion().is_ok());
    }
}

// ---------------------------------------------------------------------------
// 6. Euler extraction reproduces the rotation away from gimbal lock
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn euler_angles_rebuild_rotation(
        x in arb_angle(),
        y in -1.5f64..1.5,
        z in arb_angle(),
    ) {
        let r = Matrix::rotation_z(z)
            .mul(&Matrix::rotation_y(y)).unwrap()
            .mul(&Matrix::rotation_x(x)).unwrap();
        let e = r.euler_angles().unwrap();
        let rebuilt = Matrix::rotation_z(e.z)
            .mul(&Matrix::rotation_y(e.y)).unwrap()
            .mul(&Matrix::rotation_x(e.x)).unwrap();
        prop_assert_eq!(r, rebuilt);
    }
}
