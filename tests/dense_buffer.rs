mod tests {
    use sparse_ws2811::{
        BufferDescriptor, BufferError, DenseBuffer, LedBuffer, Rgb, SparseBuffer, color::BLACK,
    };

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
    const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };

    /// Written once, used with both buffer kinds.
    fn paint_every_third<B: LedBuffer>(leds: &mut B, color: Rgb) -> Result<(), BufferError> {
        for position in (0..B::COUNT).step_by(3) {
            leds.set(position, color)?;
        }
        Ok(())
    }

    #[test]
    fn test_get_and_write() {
        let mut leds = DenseBuffer::<8>::new();
        *leds.get(2).unwrap() = RED;
        leds.set(7, BLUE).unwrap();

        assert_eq!(leds.color_at(2), Ok(RED));
        assert_eq!(leds.color_at(7), Ok(BLUE));
        assert_eq!(leds.color_at(0), Ok(BLACK));
        assert_eq!(leds.as_slice()[2], RED);
    }

    #[test]
    fn test_out_of_range() {
        let mut leds = DenseBuffer::<8>::new();
        assert_eq!(
            leds.get(8),
            Err(BufferError::OutOfRange {
                position: 8,
                count: 8
            })
        );
        assert_eq!(
            leds.color_at(100),
            Err(BufferError::OutOfRange {
                position: 100,
                count: 8
            })
        );
    }

    #[test]
    fn test_clear() {
        let mut leds = DenseBuffer::from([RED; 4]);
        leds.clear();
        assert_eq!(leds.as_slice(), &[BLACK; 4]);
    }

    #[test]
    fn test_descriptor() {
        assert_eq!(
            DenseBuffer::<60>::DESCRIPTOR,
            BufferDescriptor {
                count: 60,
                storage_size: 180
            }
        );
        assert_eq!(
            SparseBuffer::<60, 38>::DESCRIPTOR,
            BufferDescriptor {
                count: 60,
                storage_size: 38
            }
        );
        assert_eq!(DenseBuffer::<60>::new().len(), 60);
        assert!(DenseBuffer::<0>::new().is_empty());
    }

    #[test]
    fn test_generic_code_sees_same_string() {
        let mut dense = DenseBuffer::<10>::new();
        let mut sparse = SparseBuffer::<10, 32>::new();
        paint_every_third(&mut dense, RED).unwrap();
        paint_every_third(&mut sparse, RED).unwrap();

        for position in 0..10 {
            assert_eq!(dense.color_at(position), sparse.color_at(position));
        }
    }
}
