//! The main loop: exit paths, terminal restoration and suspension.

#[cfg(test)]
mod tests {
    use std::{
        cell::Cell,
        panic::{self, AssertUnwindSafe},
        rc::Rc,
    };

    use termview::{
        Application, Error, Key, Result, Theme, ViewState,
        backend::test::{TestBackend, buf},
        geom::{Dimension, Rect},
        view::{Frame, View, shared},
        widgets::TextView,
    };

    /// Restores the cursor after clearing the screen.
    const EPILOGUE: &str = "\x1b[2J\x1b[?25h";

    /// A view that rejects every key.
    struct Grumpy {
        /// State.
        state: ViewState,
        /// Keys received.
        seen: Rc<Cell<usize>>,
    }

    impl View for Grumpy {
        fn state(&self) -> &ViewState {
            &self.state
        }
        fn state_mut(&mut self) -> &mut ViewState {
            &mut self.state
        }
        fn on_key_press(&mut self, key: Key) -> Result<()> {
            self.seen.set(self.seen.get() + 1);
            Err(Error::Invalid(format!("no thanks: {key:?}")))
        }
        fn render(&mut self, _: &mut Frame<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn esc_ends_the_loop_and_restores() {
        let (tb, backend) = TestBackend::create(Dimension::new(10, 3));
        let backend = backend.keys([Key::Down]).idle().keys([Key::Esc]);
        let mut app = Application::new(backend, Theme::default());
        let text = shared(TextView::new("hi"));
        text.borrow_mut().set_rect(Rect::new(0, 0, 10, 3));
        app.add_component(text).unwrap();

        app.run().unwrap();
        assert!(!app.is_running());
        let b = buf(&tb);
        assert_eq!((b.starts, b.stops), (1, 1));
        assert!(b.text().contains("hi"));
        assert!(b.text().ends_with(EPILOGUE));
    }

    #[test]
    fn backend_failure_still_restores() {
        let (tb, backend) = TestBackend::create(Dimension::new(10, 3));
        let mut app = Application::new(backend.keys([Key::Down]), Theme::default());
        assert!(matches!(app.run(), Err(Error::Backend(_))));
        let b = buf(&tb);
        assert!(!b.raw());
        assert_eq!(b.stops, 1);
        assert!(b.text().ends_with(EPILOGUE));
    }

    #[test]
    fn widget_errors_do_not_stop_the_loop() {
        let (_, backend) = TestBackend::create(Dimension::new(10, 3));
        let backend = backend.keys([Key::Char('a'), Key::Char('b'), Key::Esc]);
        let mut app = Application::new(backend, Theme::default());
        let seen = Rc::new(Cell::new(0));
        app.add_component(shared(Grumpy {
            state: ViewState::new("grumpy"),
            seen: seen.clone(),
        }))
        .unwrap();
        app.run().unwrap();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn handler_can_quit() {
        let (tb, backend) = TestBackend::create(Dimension::new(10, 3));
        let backend = backend.keys([Key::Char('q')]);
        let mut app = Application::new(backend, Theme::default());
        app.set_key_handler(
            Key::Char('q'),
            |app| {
                app.quit();
                Ok(())
            },
            true,
        );
        app.run().unwrap();
        assert!(!buf(&tb).raw());
    }

    #[test]
    fn loop_restarts_after_quit() {
        let (_, backend) = TestBackend::create(Dimension::new(10, 3));
        let backend = backend.keys([Key::Esc, Key::Esc]);
        let mut app = Application::new(backend, Theme::default());
        app.run().unwrap();
        app.run().unwrap();
        assert!(matches!(app.run(), Err(Error::Backend(_))));
    }

    #[test]
    fn redraws_land_between_keys() {
        let (tb, backend) = TestBackend::create(Dimension::new(10, 3));
        let backend = backend.keys([Key::Char('c')]).idle().keys([Key::Esc]);
        let mut app = Application::new(backend, Theme::default());
        let text = shared(TextView::new("before"));
        text.borrow_mut().set_rect(Rect::new(0, 0, 10, 3));
        app.add_component(text.clone()).unwrap();
        let t = text.clone();
        app.set_key_handler(
            Key::Char('c'),
            move |_| {
                t.borrow_mut().set_text("after");
                Ok(())
            },
            true,
        );
        app.run().unwrap();
        let out = buf(&tb).text();
        let before = out.find("before").unwrap();
        let after = out.find("after").unwrap();
        assert!(before < after);
    }

    #[test]
    fn suspend_releases_the_terminal() {
        let (tb, backend) = TestBackend::create(Dimension::new(10, 3));
        let backend = backend.keys([Key::Char('s'), Key::Esc]);
        let mut app = Application::new(backend, Theme::default());
        let released = Rc::new(Cell::new(false));
        let r = released.clone();
        let inner = tb.clone();
        app.set_key_handler(
            Key::Char('s'),
            move |app| {
                let was_raw = app.suspend(|| buf(&inner).raw())?;
                r.set(!was_raw);
                Ok(())
            },
            true,
        );
        app.run().unwrap();
        assert!(released.get());
        let b = buf(&tb);
        assert_eq!((b.starts, b.stops), (2, 2));
    }

    #[test]
    fn panic_during_suspend_restores_the_terminal() {
        let (tb, backend) = TestBackend::create(Dimension::new(10, 3));
        let backend = backend.keys([Key::Char('s'), Key::Esc]);
        let mut app = Application::new(backend, Theme::default());
        app.set_key_handler(
            Key::Char('s'),
            |app| app.suspend(|| panic!("editor crashed")),
            true,
        );
        let ret = panic::catch_unwind(AssertUnwindSafe(|| app.run()));
        assert!(ret.is_err());
        let b = buf(&tb);
        assert_eq!((b.starts, b.stops), (2, 2));
        assert!(!b.raw());
        assert!(b.text().ends_with(EPILOGUE));
    }
}
